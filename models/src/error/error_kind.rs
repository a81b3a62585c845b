//! Flat error taxonomy shared by every connector error type.
//!
//! Callers (gateway, schedulers, tests) branch on the kind instead of on
//! concrete error enums, so "re-authorize" vs "resubmit" vs "fix input" is
//! decided the same way everywhere.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or invalid configuration. Fatal, never retried.
    Config,
    /// Callback `state` does not match the outstanding authorization request.
    StateMismatch,
    /// Callback carries an authorization code that was already exchanged.
    Replay,
    /// The bank refused to exchange the authorization code.
    TokenExchange,
    /// No usable credential; a human must authorize.
    NotAuthorized,
    /// The bank rejected the credential (401/403); a human must re-authorize.
    AuthorizationExpired,
    /// Transient network failure, surfaced after the retry budget.
    Transport,
    /// Well-formed request refused by the bank.
    ProviderRejected,
    /// The bank answered 2xx with a body we cannot read.
    InvalidResponse,
    /// `from_date` is after `to_date`.
    InvalidRange,
    /// Caller input rejected before any network call.
    Validation,
    /// Credential persistence failed.
    CredentialStore,
    /// No connection configured under the requested name.
    UnknownConnection,
}

impl ErrorKind {
    /// Only a new authorization cycle can clear these.
    pub fn requires_reauthorization(&self) -> bool {
        matches!(self, ErrorKind::NotAuthorized | ErrorKind::AuthorizationExpired)
    }

    /// Caller mistakes; resubmitting the same input fails the same way.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidRange
                | ErrorKind::Validation
                | ErrorKind::UnknownConnection
                | ErrorKind::StateMismatch
                | ErrorKind::Replay
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::StateMismatch => "state_mismatch",
            ErrorKind::Replay => "replay",
            ErrorKind::TokenExchange => "token_exchange",
            ErrorKind::NotAuthorized => "not_authorized",
            ErrorKind::AuthorizationExpired => "authorization_expired",
            ErrorKind::Transport => "transport",
            ErrorKind::ProviderRejected => "provider_rejected",
            ErrorKind::InvalidResponse => "invalid_response",
            ErrorKind::InvalidRange => "invalid_range",
            ErrorKind::Validation => "validation",
            ErrorKind::CredentialStore => "credential_store",
            ErrorKind::UnknownConnection => "unknown_connection",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
