// Unit tests for PaymentInstruction::validate and PaymentResult constructors

use crate::{ErrorKind, PaymentInstruction, PaymentResult};

use chrono::NaiveDate;
use rust_decimal_macros::dec;

fn instruction() -> PaymentInstruction {
    PaymentInstruction {
        source_account: String::from("CY17002001280000001200527600"),
        destination_account: String::from("CY21002001950000357001234567"),
        amount: dec!(250.75),
        currency: String::from("EUR"),
        reference: String::from("INV-42"),
        execution_date: NaiveDate::from_ymd_opt(2026, 10, 20).expect("valid date"),
        beneficiary_name: None,
        source_bic: None,
        destination_bic: None,
        notes: None,
    }
}

#[test]
fn given_valid_instruction_when_validated_then_ok() {
    assert!(instruction().validate().is_ok());
}

/// **VALUE**: Negative amounts are rejected just like zero.
///
/// **WHY THIS MATTERS**: A struct literal bypasses the builder; `validate()` is the
/// last line before the bank.
///
/// **BUG THIS CATCHES**: Would catch `amount == 0` being checked instead of `<= 0`.
#[test]
fn given_negative_amount_when_validated_then_rejects_amount() {
    let mut payment = instruction();
    payment.amount = dec!(-5);

    assert_eq!(payment.validate().unwrap_err().field(), "amount");
}

#[test]
fn given_missing_or_malformed_currency_when_validated_then_rejects_currency() {
    let mut missing = instruction();
    missing.currency = String::new();

    let mut malformed = instruction();
    malformed.currency = String::from("euro");

    assert_eq!(missing.validate().unwrap_err().field(), "currency");
    assert_eq!(malformed.validate().unwrap_err().field(), "currency");
}

#[test]
fn given_empty_account_fields_when_validated_then_names_the_field() {
    let mut no_source = instruction();
    no_source.source_account = String::from(" ");

    let mut no_destination = instruction();
    no_destination.destination_account = String::new();

    assert_eq!(no_source.validate().unwrap_err().field(), "source_account");
    assert_eq!(
        no_destination.validate().unwrap_err().field(),
        "destination_account"
    );
}

#[test]
fn given_same_source_and_destination_when_validated_then_rejects() {
    let mut payment = instruction();
    payment.destination_account = payment.source_account.clone();

    assert_eq!(payment.validate().unwrap_err().field(), "destination_account");
}

/// **VALUE**: A rejected result carries the ProviderRejected kind.
///
/// **WHY THIS MATTERS**: Callers tell business refusals apart from system failures
/// through this kind; an insufficient-funds answer must never look like a crash.
///
/// **BUG THIS CATCHES**: Would catch the constructor picking a different kind.
#[test]
fn given_rejection_when_constructing_result_then_kind_is_provider_rejected() {
    let result = PaymentResult::rejected(422, vec![String::from("Insufficient funds")]);

    assert!(!result.accepted);
    assert_eq!(result.provider_reference, None);
    let rejection = result.error.expect("rejection should be present");
    assert_eq!(rejection.kind, ErrorKind::ProviderRejected);
    assert_eq!(rejection.status_code, 422);
}
