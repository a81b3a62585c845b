pub mod authorization;
pub mod bank_api;
pub mod config;
pub mod credential_store;
pub mod payment;
pub mod sync;

pub use authorization::AuthorizationError;
pub use bank_api::BankApiError;
pub use config::ConfigError;
pub use credential_store::CredentialStoreError;
pub use payment::PaymentError;
pub use sync::SyncError;

use models::ErrorKind;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error;

/// Error surface of the connector registry.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Unknown Connection Error: '{name}' {location}")]
    UnknownConnection {
        name: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error(transparent)]
    Api(#[from] BankApiError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    CredentialStore(#[from] CredentialStoreError),
}

impl ConnectorError {
    #[track_caller]
    pub fn unknown_connection(name: impl Into<String>) -> Self {
        ConnectorError::UnknownConnection {
            name: name.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ConnectorError::UnknownConnection { .. } => ErrorKind::UnknownConnection,
            ConnectorError::Authorization(e) => e.kind(),
            ConnectorError::Api(e) => e.kind(),
            ConnectorError::Sync(e) => e.kind(),
            ConnectorError::Payment(e) => e.kind(),
            ConnectorError::Config(e) => e.kind(),
            ConnectorError::CredentialStore(e) => e.kind(),
        }
    }
}
