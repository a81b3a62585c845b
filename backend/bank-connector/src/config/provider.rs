//! Where each bank lives, per environment.

use crate::config::EndpointOverrides;
use crate::error::config::ConfigError;
use crate::{
    AUTHORIZE_PATH, HELLENIC_PRODUCTION_API_URL, HELLENIC_PRODUCTION_AUTH_URL,
    HELLENIC_SANDBOX_API_URL, HELLENIC_SANDBOX_AUTH_URL, HELLENIC_SCOPES, TOKEN_EXCHANGE_PATH,
};

use models::BankProvider;

use url::Url;

/// Resolved base URLs and scope list for one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub auth_base_url: Url,
    pub api_base_url: Url,
    pub scopes: Vec<String>,
}

impl ProviderEndpoints {
    /// Built-in endpoints for `provider` in sandbox or production.
    pub fn for_provider(provider: BankProvider, is_sandbox: bool) -> Result<Self, ConfigError> {
        let (auth, api, scopes) = match (provider, is_sandbox) {
            (BankProvider::HellenicBank, true) => {
                (HELLENIC_SANDBOX_AUTH_URL, HELLENIC_SANDBOX_API_URL, &HELLENIC_SCOPES)
            }
            (BankProvider::HellenicBank, false) => (
                HELLENIC_PRODUCTION_AUTH_URL,
                HELLENIC_PRODUCTION_API_URL,
                &HELLENIC_SCOPES,
            ),
        };

        Ok(Self {
            auth_base_url: parse_base_url(auth)?,
            api_base_url: parse_base_url(api)?,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Built-in endpoints with any configured override applied on top.
    pub fn resolve(
        provider: BankProvider,
        is_sandbox: bool,
        overrides: Option<&EndpointOverrides>,
    ) -> Result<Self, ConfigError> {
        let mut endpoints = Self::for_provider(provider, is_sandbox)?;

        if let Some(overrides) = overrides {
            if let Some(ref auth) = overrides.auth_base_url {
                endpoints.auth_base_url = parse_base_url(auth)?;
            }
            if let Some(ref api) = overrides.api_base_url {
                endpoints.api_base_url = parse_base_url(api)?;
            }
            if let Some(ref scopes) = overrides.scopes {
                endpoints.scopes = scopes.clone();
            }
        }

        Ok(endpoints)
    }

    pub fn authorize_url(&self) -> Result<Url, ConfigError> {
        join(&self.auth_base_url, AUTHORIZE_PATH)
    }

    pub fn token_url(&self) -> Result<Url, ConfigError> {
        join(&self.auth_base_url, TOKEN_EXCHANGE_PATH)
    }

    pub fn api_url(&self, endpoint: &str) -> Result<Url, ConfigError> {
        join(&self.api_base_url, endpoint)
    }

    pub fn scope_param(&self) -> String {
        self.scopes.join(" ")
    }
}

/// Parse a base URL, forcing a trailing slash so `join` appends rather
/// than replaces the last path segment.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };

    let url = Url::parse(&normalized).map_err(|e| ConfigError::invalid_url(raw, e))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::validation(format!(
            "Invalid URL scheme for {raw} (expected http or https)"
        )));
    }

    Ok(url)
}

fn join(base: &Url, path: &str) -> Result<Url, ConfigError> {
    base.join(path)
        .map_err(|e| ConfigError::invalid_url(format!("{base}{path}"), e))
}
