use crate::payment::rejection::FALLBACK_MESSAGE;
use crate::payment::{exact_f64, provider_reference, rejection_messages, transfer_body};

use models::{ModelError, PaymentInstruction, PaymentInstructionBuilder};

use rust_decimal::Decimal;

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use serde_json::json;

/// **VALUE**: Nested field errors become readable messages.
///
/// **WHY THIS MATTERS**: The bank reports bad IBANs and BICs deep inside
/// `errors[].params[][]`; surfacing only "Error processing payment" leaves
/// the accountant guessing which field to fix.
///
/// **BUG THIS CATCHES**: Would catch the params walk being skipped or
/// flattened one level too shallow.
#[test]
fn given_nested_field_errors_when_extracted_then_each_field_named() {
    // GIVEN: An error list mixing message, code and nested params
    let body = json!({
        "errors": [
            {
                "code": "VALIDATION_FAILED",
                "params": [[
                    {"errorCode": "INVALID_IBAN", "field": {"exposedName": "beneficiaryAccount"}},
                    {"errorCode": "MISSING", "field": {"exposedName": "debtorBic"}}
                ]]
            },
            {"message": "Insufficient funds"}
        ]
    });

    // WHEN
    let messages = rejection_messages(&body);

    // THEN: Code, both fields and the plain message, in order
    assert_eq!(
        messages,
        vec![
            "Error code: VALIDATION_FAILED".to_string(),
            "Field 'beneficiaryAccount': INVALID_IBAN".to_string(),
            "Field 'debtorBic': MISSING".to_string(),
            "Insufficient funds".to_string(),
        ]
    );
}

#[test]
fn given_payload_message_only_when_extracted_then_used() {
    let body = json!({"payload": {"message": "Cut-off time passed"}});
    assert_eq!(rejection_messages(&body), vec!["Cut-off time passed".to_string()]);
}

#[test]
fn given_unrecognized_body_when_extracted_then_fallback_message() {
    assert_eq!(rejection_messages(&json!({})), vec![FALLBACK_MESSAGE.to_string()]);
}

/// **VALUE**: The transfer body uses the bank's field names.
///
/// **WHY THIS MATTERS**: A misspelled key is silently ignored by some
/// gateways, turning a payment to a supplier into a malformed request.
///
/// **BUG THIS CATCHES**: Would catch renamed keys, a wrong date format, or
/// notes not falling back to the reference.
#[test]
fn given_instruction_when_body_built_then_provider_fields_populated() {
    // GIVEN: A minimal valid instruction with one BIC
    let instruction = PaymentInstructionBuilder::new()
        .with_source_account("CY17002001280000001200527600")
        .with_destination_account("CY21002001950000357001234567")
        .with_amount(dec!(1250.50))
        .with_currency("eur")
        .with_reference("INV-2024-001")
        .with_execution_date(NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date"))
        .with_destination_bic("HEBACY2N")
        .build()
        .expect("valid instruction");

    // WHEN
    let body = transfer_body(&instruction).expect("body");

    // THEN
    assert_eq!(body["executionDate"], json!("2024-03-15"));
    assert_eq!(body["amount"], json!(1250.5));
    assert_eq!(body["debtorAccount"], json!("CY17002001280000001200527600"));
    assert_eq!(body["beneficiaryAccount"], json!("CY21002001950000357001234567"));
    assert_eq!(body["currency"], json!("EUR"));
    assert_eq!(body["customerReference"], json!("INV-2024-001"));
    assert_eq!(body["paymentNotes"], json!("INV-2024-001"));
    assert_eq!(body["beneficiaryBankBic"], json!("HEBACY2N"));
    assert!(body.get("debtorBic").is_none(), "Absent optionals are omitted");
}

#[test]
fn given_various_response_shapes_when_reference_read_then_first_match_wins() {
    assert_eq!(
        provider_reference(&json!({"payload": {"paymentId": "PAY-1", "id": "X"}})),
        Some("PAY-1".to_string())
    );
    assert_eq!(provider_reference(&json!({"id": 42})), Some("42".to_string()));
    assert_eq!(provider_reference(&json!({"payload": {}})), None);
}

fn instruction_for(amount: Decimal) -> PaymentInstruction {
    PaymentInstructionBuilder::new()
        .with_source_account("CY17002001280000001200527600")
        .with_destination_account("CY21002001950000357001234567")
        .with_amount(amount)
        .with_currency("EUR")
        .with_reference("INV-2024-002")
        .with_execution_date(NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date"))
        .build()
        .expect("valid instruction")
}

/// **VALUE**: The bank is never sent an amount other than the one approved.
///
/// **WHY THIS MATTERS**: Past 2^53 cents the nearest `f64` is a different
/// amount; a transfer of 90071992547409.93 would leave as .94.
///
/// **BUG THIS CATCHES**: Would catch the body silently rounding through
/// `f64`, and the error location pointing inside the body builder.
#[test]
fn given_amount_not_exact_in_f64_when_body_built_then_amount_validation_error() {
    // GIVEN
    let instruction = instruction_for(dec!(90071992547409.93));

    // WHEN
    let expected_line = line!() + 1;
    let result = transfer_body(&instruction);

    // THEN
    match result {
        Err(ModelError::Validation {
            field, location, ..
        }) => {
            assert_eq!(field, "amount");
            assert!(location.file.ends_with("tests/payment.rs"));
            assert_eq!(location.line, expected_line);
        }
        other => panic!("Expected amount validation error, got {other:?}"),
    }
}

#[test]
fn given_everyday_amounts_when_converted_then_exact_f64_kept() {
    for amount in [dec!(0.01), dec!(0.10), dec!(19.99), dec!(1250.50), dec!(999999999.99)] {
        let value = exact_f64(amount).expect("exact");
        assert_eq!(value.to_string().parse::<Decimal>().expect("decimal"), amount);
        assert_eq!(
            transfer_body(&instruction_for(amount)).expect("body")["amount"],
            json!(value)
        );
    }
    assert_eq!(exact_f64(dec!(90071992547409.93)), None);
}
