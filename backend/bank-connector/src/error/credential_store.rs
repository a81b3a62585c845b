use models::ErrorKind;

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};

use thiserror::Error as ThisError;

/// Failures of the credential persistence seam.
#[derive(Debug, ThisError)]
pub enum CredentialStoreError {
    #[error("Credential Read Error: {path}: {source} {location}")]
    Read {
        path: PathBuf,
        location: ErrorLocation,
        #[source]
        source: std::io::Error,
    },

    #[error("Credential Write Error: {path}: {source} {location}")]
    Write {
        path: PathBuf,
        location: ErrorLocation,
        #[source]
        source: std::io::Error,
    },

    #[error("Credential Parse Error: {path}: {reason} {location}")]
    Parse {
        path: PathBuf,
        reason: String,
        location: ErrorLocation,
    },

    #[error("Credential Serialization Error: {reason} {location}")]
    Serialize {
        reason: String,
        location: ErrorLocation,
    },

    #[error("Invalid Connection Key Error: '{connection}' {location}")]
    InvalidKey {
        connection: String,
        location: ErrorLocation,
    },
}

impl CredentialStoreError {
    #[track_caller]
    pub fn read(path: &Path, source: std::io::Error) -> Self {
        CredentialStoreError::Read {
            path: path.to_path_buf(),
            location: ErrorLocation::from(Location::caller()),
            source,
        }
    }

    #[track_caller]
    pub fn write(path: &Path, source: std::io::Error) -> Self {
        CredentialStoreError::Write {
            path: path.to_path_buf(),
            location: ErrorLocation::from(Location::caller()),
            source,
        }
    }

    #[track_caller]
    pub fn parse(path: &Path, reason: impl Into<String>) -> Self {
        CredentialStoreError::Parse {
            path: path.to_path_buf(),
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn serialize(reason: impl Into<String>) -> Self {
        CredentialStoreError::Serialize {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_key(connection: impl Into<String>) -> Self {
        CredentialStoreError::InvalidKey {
            connection: connection.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::CredentialStore
    }
}
