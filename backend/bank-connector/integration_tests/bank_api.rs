use crate::helpers::{
    CLIENT_ID, api_client, expired_credential, fast_retry, request_count, token_store,
    valid_credential,
};

use bank_connector::bank_api::{ApiRequest, RetryPolicy};
use bank_connector::error::BankApiError;

use models::ErrorKind;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LIST_PATH: &str = "/v1/b2b/account/list";
const TIMEOUT: Duration = Duration::from_secs(5);

fn list_request() -> ApiRequest {
    ApiRequest::get("v1/b2b/account/list")
}

// ----------------------------------------------------------------------------
// Credential precondition
// ----------------------------------------------------------------------------

/// **VALUE**: Without a credential nothing goes over the wire.
///
/// **WHY THIS MATTERS**: An unauthenticated request leaks the client id and
/// burns the bank's rate limit for a guaranteed 401.
///
/// **BUG THIS CATCHES**: Would catch sending the request before checking
/// the token store.
#[tokio::test]
async fn given_no_credential_when_call_made_then_not_authorized_without_network() {
    // GIVEN: An empty token store
    let server = MockServer::start().await;
    let client = api_client(&server, token_store(None), fast_retry(), TIMEOUT);

    // WHEN
    let result = client.call(&list_request()).await;

    // THEN
    assert!(matches!(result, Err(BankApiError::NotAuthorized { .. })));
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn given_expired_credential_when_call_made_then_not_authorized_without_network() {
    // GIVEN: A credential that expired an hour ago
    let server = MockServer::start().await;
    let client = api_client(
        &server,
        token_store(Some(expired_credential("code-1"))),
        fast_retry(),
        TIMEOUT,
    );

    // WHEN
    let result = client.call_once(&list_request()).await;

    // THEN
    assert_eq!(result.expect_err("must fail").kind(), ErrorKind::NotAuthorized);
    assert_eq!(request_count(&server).await, 0);
}

// ----------------------------------------------------------------------------
// Request shape
// ----------------------------------------------------------------------------

/// **VALUE**: Every call carries the bearer token and the client id header.
///
/// **WHY THIS MATTERS**: The bank rejects calls missing `x-client-id` even
/// with a valid token.
///
/// **BUG THIS CATCHES**: Would catch either header being dropped.
#[tokio::test]
async fn given_valid_credential_when_call_made_then_auth_headers_sent() {
    // GIVEN: A mock requiring both headers
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(header("authorization", "Bearer access-code-1"))
        .and(header("x-client-id", CLIENT_ID))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"payload": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(
        &server,
        token_store(Some(valid_credential("code-1"))),
        fast_retry(),
        TIMEOUT,
    );

    // WHEN
    let response = client
        .call(&list_request().with_query("page", "2"))
        .await
        .expect("Call should succeed");

    // THEN
    assert!(response.status.is_success());
    assert_eq!(response.body, json!({"payload": {}}));
}

// ----------------------------------------------------------------------------
// Error mapping
// ----------------------------------------------------------------------------

/// **VALUE**: 401 and 403 surface as expired authorization, never retried.
///
/// **WHY THIS MATTERS**: Retrying a revoked token wastes attempts and delays
/// telling the user to re-authorize.
///
/// **BUG THIS CATCHES**: Would catch auth failures classified as transient,
/// or the token store being cleared on 401.
#[tokio::test]
async fn given_unauthorized_responses_when_call_made_then_expired_without_retry() {
    for status in [401u16, 403] {
        // GIVEN: A bank rejecting the token
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LIST_PATH))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = token_store(Some(valid_credential("code-1")));
        let client = api_client(&server, Arc::clone(&tokens), fast_retry(), TIMEOUT);
        let before = tokens.current().expect("Seeded credential");

        // WHEN
        let result = client.call(&list_request()).await;

        // THEN
        match result {
            Err(BankApiError::AuthorizationExpired { status_code, .. }) => {
                assert_eq!(status_code.0, status)
            }
            other => panic!("Expected AuthorizationExpired for {status}, got {other:?}"),
        }
        assert_eq!(request_count(&server).await, 1);
        let after = tokens.current().expect("Credential still present");
        assert!(
            Arc::ptr_eq(&before, &after),
            "Token store slot is not replaced on {status}"
        );
        assert_eq!(*after, *before);
    }
}

/// **VALUE**: Transient 5xx answers are retried until one succeeds.
///
/// **WHY THIS MATTERS**: The bank's gateway returns sporadic 503s; a sync
/// that gives up on the first one fails most nights.
///
/// **BUG THIS CATCHES**: Would catch the retry loop not re-sending.
#[tokio::test]
async fn given_two_server_errors_then_success_when_call_made_then_succeeds_on_third() {
    // GIVEN: Two 503s followed by 200
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let client = api_client(
        &server,
        token_store(Some(valid_credential("code-1"))),
        fast_retry(),
        TIMEOUT,
    );

    // WHEN
    let response = client.call(&list_request()).await.expect("Third attempt succeeds");

    // THEN
    assert_eq!(response.body, json!({"ok": true}));
    assert_eq!(request_count(&server).await, 3);
}

/// **VALUE**: Timeouts are transient and retried like 5xx.
///
/// **WHY THIS MATTERS**: A slow bank must not be mistaken for a refusal.
///
/// **BUG THIS CATCHES**: Would catch reqwest timeouts mapped to a
/// non-retryable error.
#[tokio::test]
async fn given_two_timeouts_then_success_when_call_made_then_succeeds() {
    // GIVEN: Two responses slower than the client timeout, then a fast one
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"slow": true}))
                .set_delay(Duration::from_millis(500)),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"slow": false})))
        .mount(&server)
        .await;

    let client = api_client(
        &server,
        token_store(Some(valid_credential("code-1"))),
        fast_retry(),
        Duration::from_millis(100),
    );

    // WHEN
    let response = client.call(&list_request()).await.expect("Third attempt succeeds");

    // THEN
    assert_eq!(response.body, json!({"slow": false}));
}

#[tokio::test]
async fn given_persistent_server_error_when_call_made_then_transport_after_max_attempts() {
    // GIVEN: A bank that always answers 500
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&server)
        .await;

    let client = api_client(
        &server,
        token_store(Some(valid_credential("code-1"))),
        fast_retry(),
        TIMEOUT,
    );

    // WHEN
    let result = client.call(&list_request()).await;

    // THEN
    match result {
        Err(BankApiError::Transport {
            attempts,
            is_transient,
            status_code,
            ..
        }) => {
            assert_eq!(attempts, 3);
            assert!(is_transient);
            assert_eq!(status_code.map(|s| s.0), Some(500));
        }
        other => panic!("Expected Transport, got {other:?}"),
    }
}

#[tokio::test]
async fn given_server_error_when_call_once_made_then_single_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(
        &server,
        token_store(Some(valid_credential("code-1"))),
        fast_retry(),
        TIMEOUT,
    );

    let result = client.call_once(&list_request()).await;

    assert_eq!(result.expect_err("must fail").kind(), ErrorKind::Transport);
}

/// **VALUE**: Other 4xx answers are rejections carrying the bank's body.
///
/// **WHY THIS MATTERS**: Payment rejections are built from that body; losing
/// it loses the reason shown to the accountant.
///
/// **BUG THIS CATCHES**: Would catch 4xx being retried or the body dropped.
#[tokio::test]
async fn given_client_error_when_call_made_then_provider_rejected_without_retry() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"errors": [{"code": "E1"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(
        &server,
        token_store(Some(valid_credential("code-1"))),
        fast_retry(),
        TIMEOUT,
    );

    // WHEN
    let result = client.call(&list_request()).await;

    // THEN
    match result {
        Err(BankApiError::ProviderRejected {
            status_code, body, ..
        }) => {
            assert_eq!(status_code.0, 422);
            assert_eq!(body, json!({"errors": [{"code": "E1"}]}));
        }
        other => panic!("Expected ProviderRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn given_non_json_success_when_call_made_then_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = api_client(
        &server,
        token_store(Some(valid_credential("code-1"))),
        RetryPolicy::none(),
        TIMEOUT,
    );

    let result = client.call(&list_request()).await;

    assert_eq!(result.expect_err("must fail").kind(), ErrorKind::InvalidResponse);
}

#[tokio::test]
async fn given_empty_success_body_when_call_made_then_null_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = api_client(
        &server,
        token_store(Some(valid_credential("code-1"))),
        RetryPolicy::none(),
        TIMEOUT,
    );

    let response = client.call(&list_request()).await.expect("204 is success");

    assert!(response.body.is_null());
}
