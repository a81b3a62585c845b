use crate::helpers::{
    BASIC_AUTH_HEADER, CLIENT_ID, authorization_flow, connection, connection_with,
    query_value, redirect_uri, request_count, token_store, valid_credential,
};

use bank_connector::error::{AuthorizationError, ConfigError};

use models::ErrorKind;

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token_response(access_token: &str, expires_in: i64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": expires_in,
        "scope": "b2b.account.list b2b.report.account.statements"
    }))
}

// ----------------------------------------------------------------------------
// build_authorization_url()
// ----------------------------------------------------------------------------

/// **VALUE**: The consent URL carries every parameter the bank requires.
///
/// **WHY THIS MATTERS**: A missing `redirect_uri` or `scope` makes the bank
/// show an error page instead of the consent screen.
///
/// **BUG THIS CATCHES**: Would catch a dropped or misnamed query parameter,
/// or the same state being handed out twice.
#[tokio::test]
async fn given_connection_when_authorize_url_built_then_all_parameters_present() {
    // GIVEN: A flow against a mock bank
    let server = MockServer::start().await;
    let flow = authorization_flow(&server, connection(), token_store(None));

    // WHEN: Building two URLs
    let first = flow
        .build_authorization_url(&redirect_uri())
        .await
        .expect("Failed to build authorize url");
    let second = flow
        .build_authorization_url(&redirect_uri())
        .await
        .expect("Failed to build authorize url");

    // THEN: Path and all five parameters, fresh state each time
    assert_eq!(first.path(), "/oauth2/auth");
    assert_eq!(query_value(&first, "response_type").as_deref(), Some("code"));
    assert_eq!(query_value(&first, "client_id").as_deref(), Some(CLIENT_ID));
    assert_eq!(
        query_value(&first, "redirect_uri").as_deref(),
        Some(redirect_uri().as_str())
    );
    let scope = query_value(&first, "scope").expect("scope present");
    assert!(scope.split(' ').any(|s| s == "b2b.credit.transfer.single"));
    let first_state = query_value(&first, "state").expect("state present");
    let second_state = query_value(&second, "state").expect("state present");
    assert!(!first_state.is_empty());
    assert_ne!(first_state, second_state);
}

#[tokio::test]
async fn given_empty_client_id_when_authorize_url_built_then_config_error() {
    // GIVEN: A connection without client id
    let server = MockServer::start().await;
    let flow = authorization_flow(&server, connection_with("  ", "secret"), token_store(None));

    // WHEN
    let result = flow.build_authorization_url(&redirect_uri()).await;

    // THEN
    assert!(matches!(
        result,
        Err(AuthorizationError::Config(ConfigError::MissingClientId { .. }))
    ));
}

// ----------------------------------------------------------------------------
// handle_callback()
// ----------------------------------------------------------------------------

/// **VALUE**: A valid callback exchanges the code and stores the credential.
///
/// **WHY THIS MATTERS**: This is the only way a connection becomes usable;
/// the request must match what the bank's token endpoint expects.
///
/// **BUG THIS CATCHES**: Would catch a missing Basic auth header, a wrong
/// grant type, expiry not derived from `expires_in`, or scopes not parsed.
#[tokio::test]
async fn given_matching_state_when_callback_handled_then_credential_stored() {
    // GIVEN: A token endpoint expecting the documented request
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token/exchange"))
        .and(header("authorization", BASIC_AUTH_HEADER))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code-1"))
        .and(body_string_contains("client_id=test-client"))
        .and(body_string_contains("redirect_uri=https%3A%2F%2Ferp.example.com"))
        .respond_with(token_response("access-xyz", 3600))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = token_store(None);
    let flow = authorization_flow(&server, connection(), Arc::clone(&tokens));
    let url = flow
        .build_authorization_url(&redirect_uri())
        .await
        .expect("authorize url");
    let state = query_value(&url, "state").expect("state");

    // WHEN
    let before = Utc::now();
    let credential = flow
        .handle_callback("auth-code-1", &state)
        .await
        .expect("Callback should succeed");

    // THEN: Stored, expiring about an hour from now, with granted scopes
    let stored = tokens.current().expect("credential stored");
    assert_eq!(stored.access_token.as_str(), "access-xyz");
    assert_eq!(stored.authorization_code, "auth-code-1");
    assert_eq!(
        stored.scope,
        vec![
            "b2b.account.list".to_string(),
            "b2b.report.account.statements".to_string()
        ]
    );
    assert!(credential.expires_at >= before + Duration::seconds(3599));
    assert!(credential.expires_at <= Utc::now() + Duration::seconds(3600));
    assert!(tokens.status(Utc::now()).valid);
}

/// **VALUE**: A callback with the wrong state never reaches the bank.
///
/// **WHY THIS MATTERS**: State is the CSRF defense of the redirect flow; an
/// attacker's code must not be exchanged into this connection.
///
/// **BUG THIS CATCHES**: Would catch the exchange running before the state
/// check, or the store being touched on mismatch.
#[tokio::test]
async fn given_wrong_state_when_callback_handled_then_state_mismatch_and_no_exchange() {
    // GIVEN: An outstanding request and an existing credential
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token/exchange"))
        .respond_with(token_response("attacker", 3600))
        .expect(0)
        .mount(&server)
        .await;

    let tokens = token_store(Some(valid_credential("old-code")));
    let flow = authorization_flow(&server, connection(), Arc::clone(&tokens));
    flow.build_authorization_url(&redirect_uri())
        .await
        .expect("authorize url");

    // WHEN
    let result = flow.handle_callback("evil-code", "forged-state").await;

    // THEN
    let error = result.expect_err("Mismatched state must fail");
    assert_eq!(error.kind(), ErrorKind::StateMismatch);
    assert_eq!(
        tokens.current().expect("credential kept").authorization_code,
        "old-code"
    );
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn given_no_outstanding_request_when_callback_handled_then_state_mismatch() {
    let server = MockServer::start().await;
    let flow = authorization_flow(&server, connection(), token_store(None));

    let result = flow.handle_callback("code", "any-state").await;

    assert!(matches!(result, Err(AuthorizationError::StateMismatch { .. })));
    assert_eq!(request_count(&server).await, 0);
}

/// **VALUE**: The code the current credential came from cannot be replayed.
///
/// **WHY THIS MATTERS**: Browsers re-send redirects on refresh; a replayed
/// code must not trigger a second exchange that the bank would reject or,
/// worse, accept twice.
///
/// **BUG THIS CATCHES**: Would catch the replay guard being skipped once the
/// state token has been consumed.
#[tokio::test]
async fn given_exchanged_code_when_callback_replayed_then_replay_error() {
    // GIVEN: A completed authorization cycle
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token/exchange"))
        .respond_with(token_response("access-1", 3600))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = token_store(None);
    let flow = authorization_flow(&server, connection(), Arc::clone(&tokens));
    let url = flow
        .build_authorization_url(&redirect_uri())
        .await
        .expect("authorize url");
    let state = query_value(&url, "state").expect("state");
    flow.handle_callback("code-1", &state)
        .await
        .expect("First callback succeeds");

    // WHEN: The same callback arrives again
    let result = flow.handle_callback("code-1", &state).await;

    // THEN: Replay, store unchanged, one exchange total
    assert!(matches!(result, Err(AuthorizationError::Replay { .. })));
    assert_eq!(
        tokens.current().expect("credential").access_token.as_str(),
        "access-1"
    );
}

/// **VALUE**: A replayed code is refused even when it arrives with a fresh,
/// legitimately issued state token.
///
/// **WHY THIS MATTERS**: An attacker who captured an old redirect can start a
/// new authorization to obtain a valid state, then pair it with the stolen
/// code. The state check passes, so only the replay guard stands between
/// that code and a second exchange.
///
/// **BUG THIS CATCHES**: Would catch the replay guard only firing when the
/// state token has already been consumed.
#[tokio::test]
async fn given_fresh_state_when_old_code_replayed_then_replay_error() {
    // GIVEN: A completed cycle for code-1, then a newly issued authorize URL
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token/exchange"))
        .respond_with(token_response("access-1", 3600))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = token_store(None);
    let flow = authorization_flow(&server, connection(), Arc::clone(&tokens));
    let first_url = flow
        .build_authorization_url(&redirect_uri())
        .await
        .expect("first authorize url");
    let first_state = query_value(&first_url, "state").expect("first state");
    flow.handle_callback("code-1", &first_state)
        .await
        .expect("First callback succeeds");
    let before = tokens.current().expect("credential after first exchange");

    let fresh_url = flow
        .build_authorization_url(&redirect_uri())
        .await
        .expect("fresh authorize url");
    let fresh_state = query_value(&fresh_url, "state").expect("fresh state");
    assert_ne!(fresh_state, first_state, "A new state token is issued");

    // WHEN: The old code arrives paired with the fresh state
    let result = flow.handle_callback("code-1", &fresh_state).await;

    // THEN: Replay, credential untouched, still one exchange in total
    match result {
        Err(err @ AuthorizationError::Replay { .. }) => assert_eq!(err.kind(), ErrorKind::Replay),
        other => panic!("Expected Replay, got {other:?}"),
    }
    let after = tokens.current().expect("credential");
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(request_count(&server).await, 1);
}

/// **VALUE**: A refused exchange leaves the previous credential in place.
///
/// **WHY THIS MATTERS**: A failed re-authorization must not wipe a token
/// that is still valid for statement syncs.
///
/// **BUG THIS CATCHES**: Would catch clearing the slot before the exchange.
#[tokio::test]
async fn given_token_endpoint_error_when_callback_handled_then_store_unchanged() {
    // GIVEN: A token endpoint answering 400
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token/exchange"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})),
        )
        .mount(&server)
        .await;

    let tokens = token_store(Some(valid_credential("old-code")));
    let flow = authorization_flow(&server, connection(), Arc::clone(&tokens));
    let url = flow
        .build_authorization_url(&redirect_uri())
        .await
        .expect("authorize url");
    let state = query_value(&url, "state").expect("state");

    // WHEN
    let result = flow.handle_callback("new-code", &state).await;

    // THEN
    match result {
        Err(AuthorizationError::TokenExchange { status_code, .. }) => {
            assert_eq!(status_code.map(|s| s.0), Some(400));
        }
        other => panic!("Expected TokenExchange, got {other:?}"),
    }
    assert_eq!(
        tokens.current().expect("credential kept").authorization_code,
        "old-code"
    );
}

#[tokio::test]
async fn given_malformed_token_body_when_callback_handled_then_token_exchange_error() {
    // GIVEN: 200 with no access_token
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token/exchange"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"expires_in": 3600})))
        .mount(&server)
        .await;

    let tokens = token_store(None);
    let flow = authorization_flow(&server, connection(), Arc::clone(&tokens));
    let url = flow
        .build_authorization_url(&redirect_uri())
        .await
        .expect("authorize url");
    let state = query_value(&url, "state").expect("state");

    // WHEN
    let result = flow.handle_callback("code-1", &state).await;

    // THEN
    assert_eq!(result.expect_err("must fail").kind(), ErrorKind::TokenExchange);
    assert!(tokens.current().is_none());
}

#[tokio::test]
async fn given_missing_client_secret_when_callback_handled_then_config_error() {
    // GIVEN: No secret configured
    let server = MockServer::start().await;
    let flow = authorization_flow(&server, connection_with(CLIENT_ID, ""), token_store(None));
    let url = flow
        .build_authorization_url(&redirect_uri())
        .await
        .expect("authorize url");
    let state = query_value(&url, "state").expect("state");

    // WHEN
    let result = flow.handle_callback("code-1", &state).await;

    // THEN
    assert!(matches!(
        result,
        Err(AuthorizationError::Config(ConfigError::MissingClientSecret { .. }))
    ));
    assert_eq!(request_count(&server).await, 0);
}

/// **VALUE**: Concurrent duplicate callbacks result in exactly one exchange.
///
/// **WHY THIS MATTERS**: Double-clicked redirects arrive in parallel; two
/// exchanges of one code race to overwrite the credential.
///
/// **BUG THIS CATCHES**: Would catch the state lock being released before
/// the exchange completes.
#[tokio::test]
async fn given_parallel_duplicate_callbacks_when_handled_then_single_exchange() {
    // GIVEN: A slow token endpoint
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token/exchange"))
        .respond_with(token_response("access-1", 3600).set_delay(std::time::Duration::from_millis(100)))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = token_store(None);
    let flow = authorization_flow(&server, connection(), Arc::clone(&tokens));
    let url = flow
        .build_authorization_url(&redirect_uri())
        .await
        .expect("authorize url");
    let state = query_value(&url, "state").expect("state");

    // WHEN: Two identical callbacks at once
    let (first, second) = tokio::join!(
        flow.handle_callback("code-1", &state),
        flow.handle_callback("code-1", &state)
    );

    // THEN: Exactly one succeeds, the other is rejected as a replay
    assert!(first.is_ok() != second.is_ok(), "Exactly one callback may succeed");
    let failure = first.err().or(second.err()).expect("one failure");
    assert_eq!(failure.kind(), ErrorKind::Replay);
}
