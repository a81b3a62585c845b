use crate::helpers::{
    CONNECTION_NAME, IBAN, app, get, json_body, post_json, request_count, valid_credential,
};

use bank_connector::{ACCOUNT_LIST_ENDPOINT, CREDIT_TRANSFER_ENDPOINT};

use axum::http::StatusCode;
use axum::http::header::LOCATION;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// **VALUE**: Liveness endpoint answers without touching any connection.
#[tokio::test]
async fn given_running_gateway_when_health_requested_then_healthy() {
    // GIVEN
    let server = MockServer::start().await;
    let app = app(&server, None);

    // WHEN
    let response = get(&app, "/health").await;

    // THEN
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "bank-gateway");
    assert_eq!(request_count(&server).await, 0);
}

/// **VALUE**: Configured connections are listed by name.
#[tokio::test]
async fn given_one_connection_when_listing_then_name_returned() {
    let server = MockServer::start().await;
    let app = app(&server, None);

    let response = get(&app, "/connections").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!([CONNECTION_NAME]));
}

/// **VALUE**: Unknown connection names are 404 with a machine-readable kind.
///
/// **BUG THIS CATCHES**: Would catch the error mapping collapsing every
/// connector failure into a 500.
#[tokio::test]
async fn given_unknown_connection_when_status_requested_then_404_unknown_connection() {
    // GIVEN
    let server = MockServer::start().await;
    let app = app(&server, None);

    // WHEN
    let response = get(&app, "/connections/missing/status").await;

    // THEN
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"]["kind"], "unknown_connection");
}

/// **VALUE**: A fresh connection reports no credential.
#[tokio::test]
async fn given_no_credential_when_status_requested_then_no_credential() {
    let server = MockServer::start().await;
    let app = app(&server, None);

    let response = get(&app, &format!("/connections/{CONNECTION_NAME}/status")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["connection"], CONNECTION_NAME);
    assert_eq!(body["state"], "no_credential");
    assert_eq!(body["token"]["valid"], false);
}

/// **VALUE**: The full consent round trip works over HTTP.
///
/// **WHY THIS MATTERS**: This is the path a human takes: open the authorize
/// link, approve at the bank, land on the callback. The state issued on
/// the redirect must be accepted on the callback.
///
/// **BUG THIS CATCHES**: Would catch the redirect and callback routes
/// using different connections or redirect URIs.
#[tokio::test]
async fn given_authorize_redirect_when_callback_returns_state_then_connection_valid() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token/exchange"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "gateway-token",
            "expires_in": 1800
        })))
        .expect(1)
        .mount(&server)
        .await;
    let app = app(&server, None);

    // WHEN: Following the authorize link
    let redirect = get(&app, &format!("/connections/{CONNECTION_NAME}/authorize")).await;

    // THEN: Redirected to the bank's consent page
    assert_eq!(redirect.status(), StatusCode::SEE_OTHER);
    let location = redirect
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("Location header")
        .to_string();
    assert!(location.starts_with(&format!("{}/oauth2/auth?", server.uri())));
    assert!(location.contains("redirect_uri=https%3A%2F%2Ferp.example.com%2Fcallback%2Fhellenic"));

    let state = location
        .split(['?', '&'])
        .find_map(|part| part.strip_prefix("state="))
        .expect("state parameter")
        .to_string();

    // WHEN: The bank redirects back
    let callback = get(
        &app,
        &format!("/callback/{CONNECTION_NAME}?code=consent-code&state={state}"),
    )
    .await;

    // THEN
    assert_eq!(callback.status(), StatusCode::OK);
    let token = json_body(callback).await;
    assert_eq!(token["valid"], true);

    let status = json_body(get(&app, &format!("/connections/{CONNECTION_NAME}/status")).await).await;
    assert_eq!(status["state"], "valid");
}

/// **VALUE**: A callback with a foreign state is refused as a bad request.
#[tokio::test]
async fn given_callback_with_unknown_state_when_received_then_400_state_mismatch() {
    // GIVEN
    let server = MockServer::start().await;
    let app = app(&server, None);
    let _ = get(&app, &format!("/connections/{CONNECTION_NAME}/authorize")).await;

    // WHEN
    let response = get(
        &app,
        &format!("/callback/{CONNECTION_NAME}?code=abc&state=forged"),
    )
    .await;

    // THEN
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["kind"], "state_mismatch");
    assert_eq!(request_count(&server).await, 0);
}

/// **VALUE**: A declined consent never reaches the token endpoint.
#[tokio::test]
async fn given_bank_error_param_when_callback_received_then_400_without_exchange() {
    let server = MockServer::start().await;
    let app = app(&server, None);

    let response = get(
        &app,
        &format!("/callback/{CONNECTION_NAME}?error=access_denied&error_description=User+cancelled"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["kind"], "bad_request");
    assert!(
        body["error"]["message"]
            .as_str()
            .is_some_and(|m| m.contains("access_denied"))
    );
    assert_eq!(request_count(&server).await, 0);
}

/// **VALUE**: Unauthorized connections get 401 and the bank is never called.
///
/// **BUG THIS CATCHES**: Would catch a route that calls the bank without a
/// credential and reports the bank's answer instead.
#[tokio::test]
async fn given_no_credential_when_accounts_requested_then_401_not_authorized() {
    // GIVEN
    let server = MockServer::start().await;
    let app = app(&server, None);

    // WHEN
    let response = get(&app, &format!("/connections/{CONNECTION_NAME}/accounts")).await;

    // THEN
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"]["kind"], "not_authorized");
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn given_valid_credential_when_accounts_requested_then_accounts_listed() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/{ACCOUNT_LIST_ENDPOINT}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payload": {
                "accounts": [{
                    "accountName": "Operating",
                    "accountNumber": "1200527600",
                    "iban": IBAN,
                    "accountCurrencyCodes": ["eur"]
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let app = app(&server, Some(valid_credential()));

    // WHEN
    let response = get(&app, &format!("/connections/{CONNECTION_NAME}/accounts")).await;

    // THEN
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body[0]["iban"], IBAN);
    assert_eq!(body[0]["currency"], "EUR");
}

/// **VALUE**: Reversed date ranges are a 400 before any bank call.
#[tokio::test]
async fn given_reversed_range_when_transactions_requested_then_400_invalid_range() {
    // GIVEN
    let server = MockServer::start().await;
    let app = app(&server, Some(valid_credential()));

    // WHEN
    let response = post_json(
        &app,
        &format!("/connections/{CONNECTION_NAME}/transactions"),
        &json!({ "account": IBAN, "from_date": "2024-03-31", "to_date": "2024-03-01" }),
    )
    .await;

    // THEN
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["kind"], "invalid_range");
    assert_eq!(request_count(&server).await, 0);
}

/// **VALUE**: A bank refusal of a payment is a 200 result, not an error.
///
/// **WHY THIS MATTERS**: The payment record stores the refusal reasons for
/// a human; treating it as a failed request would lose them.
#[tokio::test]
async fn given_bank_refuses_payment_when_submitted_then_200_with_rejection() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{CREDIT_TRANSFER_ENDPOINT}")))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "errors": [{ "message": "Insufficient funds" }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let app = app(&server, Some(valid_credential()));

    // WHEN
    let response = post_json(
        &app,
        &format!("/connections/{CONNECTION_NAME}/payments"),
        &json!({
            "source_account": IBAN,
            "destination_account": "CY21002001950000357001234567",
            "amount": "125.50",
            "currency": "EUR",
            "reference": "PAY-0001",
            "execution_date": "2024-04-02"
        }),
    )
    .await;

    // THEN
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["accepted"], false);
    assert_eq!(body["error"]["status_code"], 422);
    assert_eq!(body["error"]["messages"], json!(["Insufficient funds"]));
}

/// **VALUE**: Invalid instructions are refused locally with 400.
#[tokio::test]
async fn given_zero_amount_when_payment_submitted_then_400_validation() {
    let server = MockServer::start().await;
    let app = app(&server, Some(valid_credential()));

    let response = post_json(
        &app,
        &format!("/connections/{CONNECTION_NAME}/payments"),
        &json!({
            "source_account": IBAN,
            "destination_account": "CY21002001950000357001234567",
            "amount": "0",
            "currency": "EUR",
            "reference": "PAY-0002",
            "execution_date": "2024-04-02"
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["kind"], "validation");
    assert_eq!(request_count(&server).await, 0);
}
