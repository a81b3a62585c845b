//! Client secrets come from the environment, never from `connector.json`.
//!
//! A `.env` file in the working directory or next to the executable is
//! loaded first when present. Secrets are wrapped in [`RedactedSecret`] as
//! soon as they are read; only their length is ever logged.

use crate::config::ConnectorConfig;

use common::RedactedSecret;

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use log::{debug, info, warn};

/// Secrets found for the configured connections.
#[derive(Debug, Default)]
pub struct LoadedSecrets {
    /// Connection name -> client secret.
    pub secrets: HashMap<String, RedactedSecret>,
    /// Connections whose variable was unset, empty or not unicode.
    pub missing: Vec<String>,
}

impl LoadedSecrets {
    /// Take the secret for `connection`, or an empty one when none was found.
    ///
    /// An empty secret is reported as a config error at token exchange.
    pub fn take(&mut self, connection: &str) -> RedactedSecret {
        self.secrets
            .remove(connection)
            .unwrap_or_else(|| RedactedSecret::new(""))
    }
}

/// Read every connection's `client_secret_env` variable.
pub fn load_client_secrets(config: &ConnectorConfig) -> LoadedSecrets {
    if try_load_dotenv().is_none() {
        debug!("No .env file found - will check existing environment variables");
    }

    let mut loaded = LoadedSecrets::default();

    for connection in &config.connections {
        if connection.client_secret_env.is_empty() {
            debug!(
                "Connection '{}' has no client_secret_env configured",
                connection.name
            );
            loaded.missing.push(connection.name.clone());
            continue;
        }

        match env::var(&connection.client_secret_env) {
            Ok(value) if !value.trim().is_empty() => {
                let secret = RedactedSecret::new(value.trim());
                info!(
                    "Found client secret for connection '{}' (from {}, {} chars)",
                    connection.name,
                    connection.client_secret_env,
                    secret.len()
                );
                loaded.secrets.insert(connection.name.clone(), secret);
            }
            Ok(_) => {
                warn!(
                    "Env var {} for connection '{}' is empty",
                    connection.client_secret_env, connection.name
                );
                loaded.missing.push(connection.name.clone());
            }
            Err(env::VarError::NotPresent) => {
                warn!(
                    "No {} env var found for connection '{}'",
                    connection.client_secret_env, connection.name
                );
                loaded.missing.push(connection.name.clone());
            }
            Err(env::VarError::NotUnicode(_)) => {
                warn!(
                    "Env var {} contains invalid unicode",
                    connection.client_secret_env
                );
                loaded.missing.push(connection.name.clone());
            }
        }
    }

    loaded
}

/// Load .env from the working directory or next to the executable.
/// Returns the file that was loaded.
fn try_load_dotenv() -> Option<PathBuf> {
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded .env from: {:?}", path);
        return Some(path);
    }

    if let Ok(exe_path) = env::current_exe()
        && let Some(exe_dir) = exe_path.parent()
    {
        let env_path = exe_dir.join(".env");
        if env_path.exists() {
            match dotenvy::from_path(&env_path) {
                Ok(_) => {
                    info!("Loaded .env from: {:?}", env_path);
                    return Some(env_path);
                }
                Err(e) => {
                    warn!("Failed to parse .env at {:?}: {}", env_path, e);
                }
            }
        }
    }

    None
}
