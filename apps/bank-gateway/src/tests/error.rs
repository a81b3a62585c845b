// Unit tests for error module
// Tests serialization, status mapping and the JSON body clients see

use crate::error::{GatewayError, status_for};

use bank_connector::error::ConnectorError;

use models::ErrorKind;

use axum::body::to_bytes;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::Value;

/// **VALUE**: Tests that errors serialize with their variant tag.
///
/// **WHY THIS MATTERS**: Startup failures are printed from `main` and error
/// bodies are built from the same data; a non-serializable field would
/// break both.
///
/// **BUG THIS CATCHES**: Would catch removal of `#[derive(Serialize)]` or a
/// new field that cannot be serialized.
#[test]
fn given_gateway_error_when_serialized_then_carries_variant_and_message() {
    // GIVEN
    let err = GatewayError::bad_request("Test");

    // WHEN
    let json = serde_json::to_string(&err).expect("serializable");

    // THEN
    assert!(json.contains("BadRequest"), "JSON should contain variant name");
    assert!(json.contains("Test"), "JSON should contain message");
}

/// **VALUE**: Connector failures keep their kind across the boundary.
///
/// **BUG THIS CATCHES**: Would catch a `From` impl that flattens every
/// connector error into a generic 500.
#[test]
fn given_unknown_connection_when_converted_then_kind_and_404_preserved() {
    // GIVEN
    let connector = ConnectorError::unknown_connection("nope");

    // WHEN
    let err = GatewayError::from(connector);

    // THEN
    assert_eq!(err.kind(), Some(ErrorKind::UnknownConnection));
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    assert!(err.message().contains("nope"));
}

/// **VALUE**: Re-authorization kinds map to 401 and caller mistakes to 400.
///
/// **WHY THIS MATTERS**: The ERP front end prompts a human to re-authorize on
/// 401 only. Any other status for an expired token hides the prompt.
#[test]
fn given_error_kinds_when_mapped_then_statuses_match_remedy() {
    // GIVEN / WHEN / THEN
    assert_eq!(status_for(ErrorKind::NotAuthorized), StatusCode::UNAUTHORIZED);
    assert_eq!(
        status_for(ErrorKind::AuthorizationExpired),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(status_for(ErrorKind::InvalidRange), StatusCode::BAD_REQUEST);
    assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
    assert_eq!(status_for(ErrorKind::StateMismatch), StatusCode::BAD_REQUEST);
    assert_eq!(status_for(ErrorKind::Replay), StatusCode::CONFLICT);
    assert_eq!(status_for(ErrorKind::Transport), StatusCode::BAD_GATEWAY);
    assert_eq!(
        status_for(ErrorKind::CredentialStore),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

const EVERY_KIND: [ErrorKind; 13] = [
    ErrorKind::Config,
    ErrorKind::StateMismatch,
    ErrorKind::Replay,
    ErrorKind::TokenExchange,
    ErrorKind::NotAuthorized,
    ErrorKind::AuthorizationExpired,
    ErrorKind::Transport,
    ErrorKind::ProviderRejected,
    ErrorKind::InvalidResponse,
    ErrorKind::InvalidRange,
    ErrorKind::Validation,
    ErrorKind::CredentialStore,
    ErrorKind::UnknownConnection,
];

/// **VALUE**: The status follows the kind's remedy for every kind.
///
/// **WHY THIS MATTERS**: Clients decide between prompting for
/// re-authorization, fixing their input and retrying later from the status
/// alone.
///
/// **BUG THIS CATCHES**: Would catch a new re-authorization kind mapped to
/// anything but 401, or a caller error reported as a server fault.
#[test]
fn given_every_kind_when_mapped_then_status_agrees_with_remedy() {
    for kind in EVERY_KIND {
        // WHEN
        let status = status_for(kind);

        // THEN
        assert_eq!(
            status == StatusCode::UNAUTHORIZED,
            kind.requires_reauthorization(),
            "{kind} mapped to {status}"
        );
        if kind.is_caller_error() {
            assert!(status.is_client_error(), "{kind} mapped to {status}");
        }
    }
}

/// **VALUE**: The response body names the kind in snake_case.
///
/// **BUG THIS CATCHES**: Would catch the body drifting from the `ErrorKind`
/// serde names clients branch on.
#[tokio::test]
async fn given_connector_error_when_rendered_then_json_body_has_kind() {
    // GIVEN
    let err = GatewayError::from(ConnectorError::unknown_connection("nope"));

    // WHEN
    let response = err.into_response();

    // THEN
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body: Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(body["error"]["kind"], "unknown_connection");
    assert!(
        body["error"]["message"]
            .as_str()
            .is_some_and(|m| m.contains("nope"))
    );
}
