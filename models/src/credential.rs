//! OAuth2 credential issued by the bank's authorization server.

use common::RedactedSecret;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Access token bundle for one connection.
///
/// Persisted as a single JSON blob. Validity is always computed from
/// `expires_at` and the current time, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(with = "common::redacted_secret::exposed")]
    pub access_token: RedactedSecret,
    /// Code this credential was exchanged from. Backs the callback replay guard.
    pub authorization_code: String,
    pub created_on: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Granted scopes, in the order the bank returned them.
    #[serde(default)]
    pub scope: Vec<String>,
}

impl Credential {
    /// Build a credential issued at `created_on` living for `ttl`.
    pub fn issue(
        access_token: RedactedSecret,
        authorization_code: impl Into<String>,
        created_on: DateTime<Utc>,
        ttl: Duration,
        scope: Vec<String>,
    ) -> Self {
        Self {
            access_token,
            authorization_code: authorization_code.into(),
            created_on,
            expires_at: created_on + ttl,
            scope,
        }
    }

    /// `now < expires_at`. `created_on` plays no part.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> TokenStatus {
        TokenStatus {
            valid: self.is_valid_at(now),
            expires_at: Some(self.expires_at),
            scopes: self.scope.clone(),
        }
    }
}

/// Display-only summary of a connection's credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenStatus {
    pub valid: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub scopes: Vec<String>,
}

impl TokenStatus {
    pub fn absent() -> Self {
        Self {
            valid: false,
            expires_at: None,
            scopes: Vec::new(),
        }
    }
}

/// Lifecycle of a connection's credential.
///
/// ```text
/// NoCredential --authorize--> Valid --expiry / 401 / 403--> Expired
/// Expired --authorize (new code)--> Valid
/// ```
///
/// Nothing leaves `Expired` on its own; only a new authorization cycle does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialState {
    NoCredential,
    Valid,
    Expired,
}

impl CredentialState {
    pub fn of(credential: Option<&Credential>, now: DateTime<Utc>) -> Self {
        match credential {
            None => CredentialState::NoCredential,
            Some(c) if c.is_valid_at(now) => CredentialState::Valid,
            Some(_) => CredentialState::Expired,
        }
    }
}
