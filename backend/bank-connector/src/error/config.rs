use models::ErrorKind;

use common::ErrorLocation;

use std::panic::Location;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config Read Error: {path}: {source} {location}")]
    ReadError {
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config Parse Error: {path}: {reason} {location}")]
    ParseError {
        location: ErrorLocation,
        path: PathBuf,
        reason: String,
    },

    #[error("Config Write Error: {path}: {source} {location}")]
    WriteError {
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config Serialization Error: {reason} {location}")]
    SerializeError {
        location: ErrorLocation,
        reason: String,
    },

    #[error("Config Validation Error: {reason} {location}")]
    ValidationError {
        location: ErrorLocation,
        reason: String,
    },

    #[error("Missing Client ID Error: connection '{connection}' has no client_id {location}")]
    MissingClientId {
        location: ErrorLocation,
        connection: String,
    },

    #[error("Missing Client Secret Error: connection '{connection}' has no client secret {location}")]
    MissingClientSecret {
        location: ErrorLocation,
        connection: String,
    },

    #[error("Invalid URL Error: {url}: {reason} {location}")]
    InvalidUrl {
        location: ErrorLocation,
        url: String,
        reason: String,
    },

    #[error("HTTP Client Error: {reason} {location}")]
    HttpClient {
        location: ErrorLocation,
        reason: String,
    },
}

impl ConfigError {
    #[track_caller]
    pub fn validation(reason: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            location: ErrorLocation::from(Location::caller()),
            reason: reason.into(),
        }
    }

    #[track_caller]
    pub fn missing_client_id(connection: impl Into<String>) -> Self {
        ConfigError::MissingClientId {
            location: ErrorLocation::from(Location::caller()),
            connection: connection.into(),
        }
    }

    #[track_caller]
    pub fn missing_client_secret(connection: impl Into<String>) -> Self {
        ConfigError::MissingClientSecret {
            location: ErrorLocation::from(Location::caller()),
            connection: connection.into(),
        }
    }

    #[track_caller]
    pub fn invalid_url(url: impl Into<String>, error: url::ParseError) -> Self {
        ConfigError::InvalidUrl {
            location: ErrorLocation::from(Location::caller()),
            url: url.into(),
            reason: error.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Config
    }
}
