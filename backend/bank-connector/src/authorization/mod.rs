//! Redirect-based OAuth2 authorization code flow.
//!
//! # Flow
//! 1. [`AuthorizationFlow::build_authorization_url`] records a fresh state
//!    token and returns the bank's consent URL.
//! 2. The bank redirects back with `code` and `state`.
//! 3. [`AuthorizationFlow::handle_callback`] checks replay and state, then
//!    exchanges the code and overwrites the connection's credential.
//!
//! Callbacks for one connection run one at a time; the state lock is held
//! across the exchange.

pub mod state;

pub use state::{AuthorizationState, PendingAuthorization};

use crate::config::ProviderEndpoints;
use crate::error::authorization::AuthorizationError;
use crate::error::config::ConfigError;
use crate::token_store::TokenStore;

use models::{BankConnection, Credential};

use common::RedactedSecret;

use std::sync::Arc;

use chrono::{Duration, Utc};
use log::{debug, info, warn};
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Deserializer};
use tokio::sync::Mutex;
use url::Url;
use url::form_urlencoded;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Token endpoint answer. Unknown fields are ignored.
#[derive(Deserialize)]
struct TokenResponse {
    #[serde(deserialize_with = "common::redacted_secret::exposed::deserialize")]
    access_token: RedactedSecret,
    #[serde(deserialize_with = "seconds_from_number_or_string")]
    expires_in: i64,
    #[serde(default)]
    scope: Option<String>,
}

/// Some gateways quote `expires_in`.
fn seconds_from_number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(i64),
        Text(String),
    }

    match Seconds::deserialize(deserializer)? {
        Seconds::Number(n) => Ok(n),
        Seconds::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

pub struct AuthorizationFlow {
    connection: Arc<BankConnection>,
    endpoints: ProviderEndpoints,
    http: Client,
    tokens: Arc<TokenStore>,
    state: Mutex<AuthorizationState>,
}

impl AuthorizationFlow {
    pub fn new(
        connection: Arc<BankConnection>,
        endpoints: ProviderEndpoints,
        http: Client,
        tokens: Arc<TokenStore>,
    ) -> Self {
        Self {
            connection,
            endpoints,
            http,
            tokens,
            state: Mutex::new(AuthorizationState::default()),
        }
    }

    pub fn connection(&self) -> &BankConnection {
        &self.connection
    }

    pub fn endpoints(&self) -> &ProviderEndpoints {
        &self.endpoints
    }

    /// Consent URL carrying `response_type`, `client_id`, `redirect_uri`,
    /// `scope` and a fresh `state`.
    ///
    /// # Errors
    ///
    /// [`AuthorizationError::Config`] if the connection has no client id.
    pub async fn build_authorization_url(
        &self,
        redirect_uri: &Url,
    ) -> Result<Url, AuthorizationError> {
        if !self.connection.has_client_id() {
            return Err(ConfigError::missing_client_id(&self.connection.name).into());
        }

        let mut url = self.endpoints.authorize_url()?;

        let now = Utc::now();
        let mut state = self.state.lock().await;
        if let Some(previous) = state.pending() {
            debug!(
                "Superseding outstanding authorization request for '{}' issued {}s ago",
                self.connection.name,
                (now - previous.issued_at).num_seconds()
            );
        }
        let pending = state.issue(redirect_uri.clone(), now);

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.connection.client_id)
            .append_pair("redirect_uri", pending.redirect_uri.as_str())
            .append_pair("scope", &self.endpoints.scope_param())
            .append_pair("state", &pending.state_token);

        info!(
            "Issued authorization request for '{}' (redirect {})",
            self.connection.name, redirect_uri
        );
        Ok(url)
    }

    /// Finish the cycle started by [`Self::build_authorization_url`].
    ///
    /// # Errors
    ///
    /// - `Replay` if `code` is the one the stored credential came from
    /// - `StateMismatch` if `state` is not the outstanding token
    /// - `Config` if the client secret is missing
    /// - `TokenExchange` if the bank refuses or answers garbage
    ///
    /// On any error the stored credential is untouched.
    pub async fn handle_callback(
        &self,
        code: &str,
        state_token: &str,
    ) -> Result<Arc<Credential>, AuthorizationError> {
        let mut state = self.state.lock().await;

        if let Some(existing) = self.tokens.current()
            && existing.authorization_code == code
        {
            warn!(
                "Rejected replayed authorization code for '{}'",
                self.connection.name
            );
            return Err(AuthorizationError::replay(&self.connection.name));
        }

        if !state.matches(state_token) {
            warn!(
                "Rejected callback for '{}': state does not match outstanding request",
                self.connection.name
            );
            return Err(AuthorizationError::state_mismatch(&self.connection.name));
        }

        if code.trim().is_empty() {
            return Err(AuthorizationError::token_exchange(
                &self.connection.name,
                "Callback carried no authorization code",
                None,
            ));
        }

        if !self.connection.has_client_secret() {
            return Err(ConfigError::missing_client_secret(&self.connection.name).into());
        }

        let pending = state
            .take_matching(state_token)
            .ok_or_else(|| AuthorizationError::state_mismatch(&self.connection.name))?;

        let credential = self.exchange_code(code, &pending.redirect_uri).await?;
        let credential = self.tokens.replace(credential)?;

        info!("Authorization completed for '{}'", self.connection.name);
        Ok(credential)
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &Url,
    ) -> Result<Credential, AuthorizationError> {
        let name = &self.connection.name;
        let token_url = self.endpoints.token_url()?;

        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "authorization_code")
            .append_pair("code", code)
            .append_pair("redirect_uri", redirect_uri.as_str())
            .append_pair("client_id", &self.connection.client_id)
            .finish();

        debug!("Exchanging authorization code for '{}' at {}", name, token_url);

        let requested_at = Utc::now();
        let response = self
            .http
            .post(token_url)
            .basic_auth(
                &self.connection.client_id,
                Some(self.connection.client_secret.as_str()),
            )
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| AuthorizationError::token_exchange(name, e.to_string(), None))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AuthorizationError::token_exchange(name, e.to_string(), Some(status.as_u16())))?;

        if !status.is_success() {
            warn!("Token exchange for '{}' failed: HTTP {}", name, status.as_u16());
            return Err(AuthorizationError::token_exchange(
                name,
                format!("HTTP {} - {}", status.as_u16(), text),
                Some(status.as_u16()),
            ));
        }

        let token: TokenResponse = serde_json::from_str(&text).map_err(|e| {
            AuthorizationError::token_exchange(
                name,
                format!("Malformed token response: {e}"),
                Some(status.as_u16()),
            )
        })?;

        if token.access_token.is_empty() || token.expires_in <= 0 {
            return Err(AuthorizationError::token_exchange(
                name,
                "Token response lacks a usable access_token or expires_in",
                Some(status.as_u16()),
            ));
        }

        let scope = match token.scope {
            Some(ref granted) if !granted.trim().is_empty() => {
                granted.split_whitespace().map(str::to_string).collect()
            }
            _ => self.endpoints.scopes.clone(),
        };

        Ok(Credential::issue(
            token.access_token,
            code,
            requested_at,
            Duration::seconds(token.expires_in),
            scope,
        ))
    }
}
