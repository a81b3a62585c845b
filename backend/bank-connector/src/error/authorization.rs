use crate::error::config::ConfigError;
use crate::error::credential_store::CredentialStoreError;

use models::ErrorKind;

use common::{ErrorLocation, HttpStatusCode};

use std::panic::Location;

use thiserror::Error as ThisError;

/// Errors of the redirect-based authorization cycle.
///
/// None of these leave a partial credential behind.
#[derive(Debug, ThisError)]
pub enum AuthorizationError {
    #[error("State Mismatch Error: callback for '{connection}' does not match the outstanding request {location}")]
    StateMismatch {
        connection: String,
        location: ErrorLocation,
    },

    #[error("Replay Error: authorization code for '{connection}' was already exchanged {location}")]
    Replay {
        connection: String,
        location: ErrorLocation,
    },

    #[error("Token Exchange Error for '{connection}': {message} {location}")]
    TokenExchange {
        connection: String,
        message: String,
        status_code: Option<HttpStatusCode>,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    CredentialStore(#[from] CredentialStoreError),
}

impl AuthorizationError {
    #[track_caller]
    pub fn state_mismatch(connection: impl Into<String>) -> Self {
        AuthorizationError::StateMismatch {
            connection: connection.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn replay(connection: impl Into<String>) -> Self {
        AuthorizationError::Replay {
            connection: connection.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn token_exchange(
        connection: impl Into<String>,
        message: impl Into<String>,
        status_code: Option<u16>,
    ) -> Self {
        AuthorizationError::TokenExchange {
            connection: connection.into(),
            message: message.into(),
            status_code: status_code.map(HttpStatusCode),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthorizationError::StateMismatch { .. } => ErrorKind::StateMismatch,
            AuthorizationError::Replay { .. } => ErrorKind::Replay,
            AuthorizationError::TokenExchange { .. } => ErrorKind::TokenExchange,
            AuthorizationError::Config(e) => e.kind(),
            AuthorizationError::CredentialStore(e) => e.kind(),
        }
    }
}
