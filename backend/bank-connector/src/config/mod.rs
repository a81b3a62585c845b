pub mod provider;
pub mod secrets;

pub use provider::ProviderEndpoints;
pub use secrets::{LoadedSecrets, load_client_secrets};

use crate::error::config::ConfigError;

use models::{BankConnection, BankProvider};

use common::{ErrorLocation, RedactedSecret};

use std::collections::HashSet;
use std::env;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

const CONFIG_FILE_NAME: &str = "connector.json";
const CONFIG_VERSION: u32 = 1;
const CONFIG_DIR_ENV: &str = "BANK_CONNECTOR_CONFIG_DIR";
const APP_DIR_NAME: &str = "bank-connector";
const CREDENTIALS_DIR_NAME: &str = "credentials";

const MAX_TIMEOUT_SECS: u64 = 300;
const MAX_RETRY_ATTEMPTS: u32 = 10;

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Per-connection endpoint replacement, for staging hosts and tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndpointOverrides {
    #[serde(default)]
    pub auth_base_url: Option<String>,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub provider: BankProvider,
    #[serde(default = "default_is_sandbox")]
    pub is_sandbox: bool,
    #[serde(default)]
    pub client_id: String,
    /// Name of the environment variable holding the client secret.
    #[serde(default)]
    pub client_secret_env: String,
    #[serde(default)]
    pub parent_account: Option<String>,
    #[serde(default)]
    pub endpoints: Option<EndpointOverrides>,
}

impl ConnectionConfig {
    /// Bind the loaded secret to this entry.
    pub fn to_connection(&self, client_secret: RedactedSecret) -> BankConnection {
        BankConnection {
            name: self.name.clone(),
            title: if self.title.trim().is_empty() {
                self.name.clone()
            } else {
                self.title.clone()
            },
            provider: self.provider,
            is_sandbox: self.is_sandbox,
            client_id: self.client_id.trim().to_string(),
            client_secret,
            parent_account: self.parent_account.clone(),
        }
    }

    pub fn endpoints(&self) -> Result<ProviderEndpoints, ConfigError> {
        ProviderEndpoints::resolve(self.provider, self.is_sandbox, self.endpoints.as_ref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectorConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Externally reachable base of the gateway; redirect URIs hang off it.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    /// Where credential blobs go. Defaults to `<config_dir>/credentials`.
    #[serde(default)]
    pub credential_dir: Option<PathBuf>,

    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            public_base_url: default_public_base_url(),
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
            credential_dir: None,
            connections: Vec::new(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_public_base_url() -> String {
    "http://127.0.0.1:8085/".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_attempts() -> u32 {
    3
}
fn default_initial_delay_ms() -> u64 {
    500
}
fn default_max_delay_ms() -> u64 {
    4_000
}
fn default_is_sandbox() -> bool {
    true
}

// ============================================
// IMPLEMENTATION
// ============================================

impl ConnectorConfig {
    /// Load config from {config_dir}/connector.json.
    ///
    /// # Returns
    ///
    /// Returns `Ok(ConnectorConfig)` if loaded successfully or defaults if file missing.
    /// Returns `Err(ConfigError)` if file exists but is corrupted/invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: ConnectorConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!(
            "Config loaded from {} ({} connection(s))",
            config_path.display(),
            config.connections.len()
        );
        Ok(config)
    }

    /// Save config to {config_dir}/connector.json using atomic write.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation, serialization, write or rename fails.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", CONFIG_FILE_NAME));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::validation(format!(
                "Invalid version: {} (expected 1-{})",
                self.version, CONFIG_VERSION
            )));
        }

        provider::parse_base_url(&self.public_base_url)?;

        if self.http.timeout_secs == 0 || self.http.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::validation(format!(
                "Invalid http.timeout_secs: {} (must be 1-{})",
                self.http.timeout_secs, MAX_TIMEOUT_SECS
            )));
        }

        if self.retry.max_attempts == 0 || self.retry.max_attempts > MAX_RETRY_ATTEMPTS {
            return Err(ConfigError::validation(format!(
                "Invalid retry.max_attempts: {} (must be 1-{})",
                self.retry.max_attempts, MAX_RETRY_ATTEMPTS
            )));
        }

        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::validation(format!(
                "retry.initial_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.retry.initial_delay_ms, self.retry.max_delay_ms
            )));
        }

        let mut seen = HashSet::new();
        for connection in &self.connections {
            if !is_valid_connection_name(&connection.name) {
                return Err(ConfigError::validation(format!(
                    "Invalid connection name '{}' (use letters, digits, '-' or '_')",
                    connection.name
                )));
            }

            if !seen.insert(connection.name.as_str()) {
                return Err(ConfigError::validation(format!(
                    "Duplicate connection name '{}'",
                    connection.name
                )));
            }

            // Endpoint overrides must parse now, not at first use
            connection.endpoints()?;
        }

        Ok(())
    }

    /// `<public_base_url>/callback/<name>`.
    pub fn redirect_uri(&self, name: &str) -> Result<Url, ConfigError> {
        let base = provider::parse_base_url(&self.public_base_url)?;
        base.join(&format!("callback/{name}"))
            .map_err(|e| ConfigError::invalid_url(format!("{base}callback/{name}"), e))
    }

    pub fn credential_dir(&self, config_dir: &Path) -> PathBuf {
        self.credential_dir
            .clone()
            .unwrap_or_else(|| config_dir.join(CREDENTIALS_DIR_NAME))
    }
}

/// Connection names end up in URLs and file names.
pub fn is_valid_connection_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Config directory: `BANK_CONNECTOR_CONFIG_DIR` if set, else the platform
/// config dir plus `bank-connector`.
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(custom_dir) = env::var(CONFIG_DIR_ENV) {
        info!("Using {} override: {:?}", CONFIG_DIR_ENV, custom_dir);
        return Ok(PathBuf::from(custom_dir));
    }

    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| {
            ConfigError::validation(format!(
                "Could not determine config directory; set {CONFIG_DIR_ENV}"
            ))
        })
}

/// Shared HTTP client; every request inherits the configured timeout.
pub fn build_http_client(http: &HttpConfig) -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(http.timeout())
        .build()
        .map_err(|e| ConfigError::HttpClient {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })
}
