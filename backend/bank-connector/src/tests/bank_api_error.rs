use crate::error::{BankApiError, ConnectorError, PaymentError, SyncError};

use models::ErrorKind;

use chrono::NaiveDate;
use serde_json::json;

/// **VALUE**: Only transient failures are retryable.
///
/// **WHY THIS MATTERS**: Retrying a 401 hammers the bank with a dead token;
/// retrying a 4xx repeats a request the bank already refused.
///
/// **BUG THIS CATCHES**: Would catch `is_retryable()` drifting to true for
/// authorization or rejection errors.
#[test]
fn given_each_error_category_when_checked_then_only_transient_retryable() {
    // GIVEN / WHEN / THEN
    assert!(BankApiError::server_error("hb", 503, "busy", 1).is_retryable());
    assert!(!BankApiError::authorization_expired("hb", 401).is_retryable());
    assert!(!BankApiError::provider_rejected("hb", 422, "{}").is_retryable());
    assert!(!BankApiError::not_authorized("hb", "no credential").is_retryable());
    assert!(!BankApiError::invalid_response("hb", "html").is_retryable());
}

/// **VALUE**: Rejection bodies are kept as JSON when they parse.
///
/// **WHY THIS MATTERS**: Payment rejection messages are extracted from the
/// structured body; a stringified body would lose every field error.
///
/// **BUG THIS CATCHES**: Would catch storing the raw text instead of JSON.
#[test]
fn given_json_body_when_provider_rejected_built_then_body_is_structured() {
    // GIVEN: A JSON error body
    let raw = r#"{"errors":[{"message":"Insufficient funds"}]}"#;

    // WHEN: Building the error
    let error = BankApiError::provider_rejected("hb", 422, raw);

    // THEN: Body is a JSON object, status preserved
    match error {
        BankApiError::ProviderRejected {
            status_code, body, ..
        } => {
            assert_eq!(status_code.0, 422);
            assert_eq!(body, json!({"errors":[{"message":"Insufficient funds"}]}));
        }
        other => panic!("Expected ProviderRejected, got {other:?}"),
    }
}

#[test]
fn given_plain_text_body_when_provider_rejected_built_then_body_is_string() {
    let error = BankApiError::provider_rejected("hb", 400, "Bad Request");
    match error {
        BankApiError::ProviderRejected { body, .. } => assert_eq!(body, json!("Bad Request")),
        other => panic!("Expected ProviderRejected, got {other:?}"),
    }
}

/// **VALUE**: Wrapped errors keep their original kind.
///
/// **WHY THIS MATTERS**: The gateway maps kinds to HTTP statuses; an expired
/// authorization buried in a sync error must still read as expired.
///
/// **BUG THIS CATCHES**: Would catch wrapper enums reporting their own kind.
#[test]
fn given_nested_errors_when_kind_read_then_innermost_kind_reported() {
    // GIVEN: Errors wrapped through sync, payment and registry layers
    let sync: ConnectorError = SyncError::from(BankApiError::authorization_expired("hb", 403)).into();
    let payment: ConnectorError =
        PaymentError::from(BankApiError::server_error("hb", 502, "", 3)).into();
    let range: ConnectorError = SyncError::invalid_range(
        NaiveDate::from_ymd_opt(2024, 2, 1).expect("valid date"),
        NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
    )
    .into();

    // WHEN / THEN
    assert_eq!(sync.kind(), ErrorKind::AuthorizationExpired);
    assert_eq!(payment.kind(), ErrorKind::Transport);
    assert_eq!(range.kind(), ErrorKind::InvalidRange);
    assert_eq!(
        ConnectorError::unknown_connection("nope").kind(),
        ErrorKind::UnknownConnection
    );
}

#[test]
fn given_transport_error_when_status_code_read_then_present() {
    let error = BankApiError::server_error("hb", 504, "gateway timeout", 3);
    assert_eq!(error.status_code(), Some(504));
    assert!(error.to_string().contains("after 3 attempt(s)"));
}
