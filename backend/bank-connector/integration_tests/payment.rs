use crate::helpers::{IBAN, api_client, fast_retry, request_count, token_store, valid_credential};

use bank_connector::error::PaymentError;
use bank_connector::payment::PaymentInitiator;

use models::{ErrorKind, PaymentInstruction, PaymentInstructionBuilder};

use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TRANSFER_PATH: &str = "/v1/b2b/credit/transfer";
const BENEFICIARY_IBAN: &str = "CY21002001950000357001234567";

fn instruction() -> PaymentInstruction {
    PaymentInstructionBuilder::new()
        .with_source_account(IBAN)
        .with_destination_account(BENEFICIARY_IBAN)
        .with_amount(dec!(250.00))
        .with_currency("EUR")
        .with_reference("PINV-0001")
        .with_execution_date(NaiveDate::from_ymd_opt(2024, 4, 2).expect("valid date"))
        .with_beneficiary_name("Acme Supplies Ltd")
        .build()
        .expect("valid instruction")
}

fn initiator(server: &MockServer) -> PaymentInitiator {
    PaymentInitiator::new(api_client(
        server,
        token_store(Some(valid_credential("code-1"))),
        fast_retry(),
        Duration::from_secs(5),
    ))
}

/// **VALUE**: An invalid instruction never reaches the bank.
///
/// **WHY THIS MATTERS**: A zero or negative transfer sent to the bank is at
/// best a confusing rejection and at worst a booked reversal.
///
/// **BUG THIS CATCHES**: Would catch validation running after submission.
#[tokio::test]
async fn given_non_positive_amount_when_submitted_then_validation_without_network() {
    // GIVEN: An instruction with a zero amount (built directly, bypassing the builder)
    let server = MockServer::start().await;
    let mut bad = instruction();
    bad.amount = dec!(0);

    // WHEN
    let result = initiator(&server).submit(&bad).await;

    // THEN
    match result {
        Err(PaymentError::Validation(e)) => assert_eq!(e.field(), "amount"),
        other => panic!("Expected Validation, got {other:?}"),
    }
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn given_lowercase_currency_when_submitted_then_validation_error() {
    let server = MockServer::start().await;
    let mut bad = instruction();
    bad.currency = "eur".to_string();

    let result = initiator(&server).submit(&bad).await;

    assert_eq!(result.expect_err("must fail").kind(), ErrorKind::Validation);
    assert_eq!(request_count(&server).await, 0);
}

/// **VALUE**: An accepted transfer returns the bank's reference.
///
/// **WHY THIS MATTERS**: The reference is what the accountant quotes when a
/// supplier asks where their money is.
///
/// **BUG THIS CATCHES**: Would catch a wrong body shape or a lost reference.
#[tokio::test]
async fn given_accepting_bank_when_submitted_then_accepted_with_reference() {
    // GIVEN: A bank expecting the documented body
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TRANSFER_PATH))
        .and(header("x-client-id", "test-client"))
        .and(body_partial_json(json!({
            "executionDate": "2024-04-02",
            "amount": 250.0,
            "debtorAccount": IBAN,
            "beneficiaryAccount": BENEFICIARY_IBAN,
            "beneficiaryName": "Acme Supplies Ltd",
            "currency": "EUR",
            "customerReference": "PINV-0001",
            "paymentNotes": "PINV-0001"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"payload": {"paymentId": "HB-777"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    // WHEN
    let result = initiator(&server)
        .submit(&instruction())
        .await
        .expect("Submission succeeds");

    // THEN
    assert!(result.accepted);
    assert_eq!(result.provider_reference.as_deref(), Some("HB-777"));
    assert!(result.error.is_none());
}

/// **VALUE**: A bank refusal is a result, not an error.
///
/// **WHY THIS MATTERS**: Callers treat `Err` as "system broken, retry
/// later"; an insufficient-funds refusal must instead be shown to the user.
///
/// **BUG THIS CATCHES**: Would catch ProviderRejected leaking out as `Err`,
/// or the nested messages being lost.
#[tokio::test]
async fn given_rejecting_bank_when_submitted_then_rejected_result_with_messages() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TRANSFER_PATH))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "errors": [{
                "message": "Validation failed",
                "params": [[{"errorCode": "INVALID", "field": {"exposedName": "beneficiaryBankBic"}}]]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    // WHEN
    let result = initiator(&server)
        .submit(&instruction())
        .await
        .expect("Rejection is not an error");

    // THEN
    assert!(!result.accepted);
    let rejection = result.error.expect("rejection present");
    assert_eq!(rejection.kind, ErrorKind::ProviderRejected);
    assert_eq!(rejection.status_code, 422);
    assert_eq!(
        rejection.messages,
        vec![
            "Validation failed".to_string(),
            "Field 'beneficiaryBankBic': INVALID".to_string()
        ]
    );
}

/// **VALUE**: Payments are attempted exactly once, even on 5xx.
///
/// **WHY THIS MATTERS**: A 503 may arrive after the bank booked the
/// transfer; resending would pay the supplier twice.
///
/// **BUG THIS CATCHES**: Would catch payments routed through the retrying
/// call path.
#[tokio::test]
async fn given_server_error_when_submitted_then_transport_error_after_one_attempt() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TRANSFER_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    // WHEN
    let result = initiator(&server).submit(&instruction()).await;

    // THEN
    assert_eq!(result.expect_err("must fail").kind(), ErrorKind::Transport);
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn given_expired_authorization_when_submitted_then_error_not_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TRANSFER_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = initiator(&server).submit(&instruction()).await;

    assert_eq!(
        result.expect_err("must fail").kind(),
        ErrorKind::AuthorizationExpired
    );
}
