use bank_connector::error::ConnectorError;

use models::ErrorKind;

use common::ErrorLocation;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{error, warn};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Errors returned by gateway handlers and startup.
///
/// Rendered to callers as JSON carrying the connector's `ErrorKind`, so a
/// client can tell "re-authorize" from "fix your input" without parsing
/// the message.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayError {
    /// Error from this app (logging, config directory, listener)
    #[error("Gateway Error: {message} {location}")]
    Gateway {
        message: String,
        location: ErrorLocation,
    },

    /// Error surfaced by the connector registry
    #[error("Connector Error: {message} {location}")]
    Connector {
        kind: ErrorKind,
        message: String,
        location: ErrorLocation,
    },

    /// Request the gateway refuses before reaching the connector
    #[error("Bad Request Error: {message} {location}")]
    BadRequest {
        message: String,
        location: ErrorLocation,
    },
}

impl GatewayError {
    #[track_caller]
    pub fn gateway(message: impl Into<String>) -> Self {
        GatewayError::Gateway {
            message: message.into(),
            location: ErrorLocation::caller(),
        }
    }

    #[track_caller]
    pub fn bad_request(message: impl Into<String>) -> Self {
        GatewayError::BadRequest {
            message: message.into(),
            location: ErrorLocation::caller(),
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            GatewayError::Connector { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            GatewayError::Gateway { message, .. }
            | GatewayError::Connector { message, .. }
            | GatewayError::BadRequest { message, .. } => message,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Gateway { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Connector { kind, .. } => status_for(*kind),
            GatewayError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<ConnectorError> for GatewayError {
    #[track_caller]
    fn from(err: ConnectorError) -> Self {
        GatewayError::Connector {
            kind: err.kind(),
            message: err.to_string(),
            location: ErrorLocation::caller(),
        }
    }
}

/// HTTP status a connector failure is reported with.
///
/// Re-authorization kinds are 401 and caller mistakes 4xx; the specific
/// caller kinds are matched before the generic 400.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        k if k.requires_reauthorization() => StatusCode::UNAUTHORIZED,
        ErrorKind::UnknownConnection => StatusCode::NOT_FOUND,
        ErrorKind::Replay => StatusCode::CONFLICT,
        k if k.is_caller_error() => StatusCode::BAD_REQUEST,
        ErrorKind::ProviderRejected => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::TokenExchange | ErrorKind::Transport | ErrorKind::InvalidResponse => {
            StatusCode::BAD_GATEWAY
        }
        // Config, CredentialStore
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{self}");
        } else {
            warn!("{self}");
        }

        let kind = match &self {
            GatewayError::Connector { kind, .. } => json!(kind),
            GatewayError::Gateway { .. } => json!("gateway"),
            GatewayError::BadRequest { .. } => json!("bad_request"),
        };

        let body = json!({
            "error": {
                "kind": kind,
                "message": self.message(),
            }
        });

        (status, Json(body)).into_response()
    }
}
