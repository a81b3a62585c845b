//! Error types for authenticated calls against the bank API.
//!
//! Key design decisions:
//! - HTTP status codes stored directly (not parsed from strings)
//! - `is_retryable()` uses error category and status, not message content
//! - 401/403 get their own variant so callers re-authorize instead of retrying
//! - All errors include ErrorLocation for debugging

use crate::error::config::ConfigError;

use models::ErrorKind;

use common::{ErrorLocation, HttpStatusCode};

use std::panic::Location;

use serde_json::Value;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum BankApiError {
    #[error("Not authorized for '{connection}': {reason} {location}")]
    NotAuthorized {
        connection: String,
        reason: String,
        location: ErrorLocation,
    },

    #[error("Authorization expired for '{connection}': HTTP {status_code} {location}")]
    AuthorizationExpired {
        connection: String,
        status_code: HttpStatusCode,
        location: ErrorLocation,
    },

    #[error("Transport error for '{connection}' after {attempts} attempt(s): {message} {location}")]
    Transport {
        connection: String,
        message: String,
        status_code: Option<HttpStatusCode>,
        is_timeout: bool,
        is_transient: bool,
        attempts: u32,
        location: ErrorLocation,
    },

    #[error("Provider rejected request for '{connection}': HTTP {status_code} - {body} {location}")]
    ProviderRejected {
        connection: String,
        status_code: HttpStatusCode,
        body: Value,
        location: ErrorLocation,
    },

    #[error("Invalid response for '{connection}': {message} {location}")]
    InvalidResponse {
        connection: String,
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BankApiError {
    #[track_caller]
    pub fn not_authorized(connection: impl Into<String>, reason: impl Into<String>) -> Self {
        BankApiError::NotAuthorized {
            connection: connection.into(),
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn authorization_expired(connection: impl Into<String>, status_code: u16) -> Self {
        BankApiError::AuthorizationExpired {
            connection: connection.into(),
            status_code: HttpStatusCode(status_code),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_response(connection: impl Into<String>, message: impl Into<String>) -> Self {
        BankApiError::InvalidResponse {
            connection: connection.into(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// 5xx answer from the bank. Transient.
    #[track_caller]
    pub fn server_error(
        connection: impl Into<String>,
        status_code: u16,
        body: impl Into<String>,
        attempts: u32,
    ) -> Self {
        BankApiError::Transport {
            connection: connection.into(),
            message: format!("HTTP {} - {}", status_code, body.into()),
            status_code: Some(HttpStatusCode(status_code)),
            is_timeout: false,
            is_transient: true,
            attempts,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Non-auth 4xx answer. The body is kept as JSON when it parses.
    #[track_caller]
    pub fn provider_rejected(
        connection: impl Into<String>,
        status_code: u16,
        body: impl Into<String>,
    ) -> Self {
        let raw = body.into();
        let body = serde_json::from_str(&raw).unwrap_or(Value::String(raw));

        BankApiError::ProviderRejected {
            connection: connection.into(),
            status_code: HttpStatusCode(status_code),
            body,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Create from reqwest error with proper categorization.
    #[track_caller]
    pub fn from_reqwest(connection: impl Into<String>, error: &reqwest::Error, attempts: u32) -> Self {
        // Check for specific error types BEFORE converting to string
        let is_timeout = error.is_timeout();
        let is_transient = is_timeout || error.is_connect() || error.is_request() || error.is_body();

        BankApiError::Transport {
            connection: connection.into(),
            message: error.to_string(),
            status_code: error.status().map(|s| HttpStatusCode(s.as_u16())),
            is_timeout,
            is_transient,
            attempts,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Check if this error is retryable based on error category, NOT string content.
    pub fn is_retryable(&self) -> bool {
        match self {
            BankApiError::Transport { is_transient, .. } => *is_transient,

            // Re-authorization, caller fixes, or bank decisions: never retried
            BankApiError::NotAuthorized { .. } => false,
            BankApiError::AuthorizationExpired { .. } => false,
            BankApiError::ProviderRejected { .. } => false,
            BankApiError::InvalidResponse { .. } => false,
            BankApiError::Config(_) => false,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BankApiError::NotAuthorized { .. } => ErrorKind::NotAuthorized,
            BankApiError::AuthorizationExpired { .. } => ErrorKind::AuthorizationExpired,
            BankApiError::Transport { .. } => ErrorKind::Transport,
            BankApiError::ProviderRejected { .. } => ErrorKind::ProviderRejected,
            BankApiError::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            BankApiError::Config(_) => ErrorKind::Config,
        }
    }

    /// Get HTTP status code if applicable.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            BankApiError::AuthorizationExpired { status_code, .. } => Some(status_code.0),
            BankApiError::ProviderRejected { status_code, .. } => Some(status_code.0),
            BankApiError::Transport { status_code, .. } => status_code.map(|s| s.0),
            _ => None,
        }
    }
}
