use crate::{ModelError, PaymentInstructionBuilder};

use chrono::NaiveDate;
use rust_decimal_macros::dec;

fn complete_builder() -> PaymentInstructionBuilder {
    PaymentInstructionBuilder::default()
        .with_source_account("CY17002001280000001200527600")
        .with_destination_account("CY21002001950000357001234567")
        .with_amount(dec!(100))
        .with_currency("EUR")
        .with_reference("INV-1")
        .with_execution_date(NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date"))
}

/// **VALUE**: Verifies that the builder rejects a missing amount.
///
/// **WHY THIS MATTERS**: An instruction without an amount can never be a valid
/// transfer; the builder must refuse it before any caller thinks it has one.
///
/// **BUG THIS CATCHES**: Would catch if required field checks are removed or
/// the amount silently defaults to zero.
#[test]
fn given_missing_amount_when_building_then_returns_validation_error() {
    // GIVEN: Builder with every field except the amount
    let builder = PaymentInstructionBuilder::default()
        .with_source_account("CY17002001280000001200527600")
        .with_destination_account("CY21002001950000357001234567")
        .with_currency("EUR")
        .with_reference("INV-1")
        .with_execution_date(NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date"));

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error naming the field
    match result.unwrap_err() {
        ModelError::Validation { field, message, .. } => {
            assert_eq!(field, "amount");
            assert_eq!(message, "Amount is required");
        }
    }
}

/// **VALUE**: Verifies that the builder rejects a zero amount.
///
/// **WHY THIS MATTERS**: A zero transfer reaching the bank wastes a submission and,
/// depending on the bank, may still create a payment record.
///
/// **BUG THIS CATCHES**: Would catch if `build()` skips `validate()`.
#[test]
fn given_zero_amount_when_building_then_returns_validation_error() {
    // GIVEN: A complete builder with amount zero
    let builder = complete_builder().with_amount(dec!(0));

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should fail on the amount
    let err = result.unwrap_err();
    assert_eq!(err.field(), "amount");
}

/// **VALUE**: Verifies that the builder normalizes text fields.
///
/// **WHY THIS MATTERS**: Payment records arrive from ERP forms with stray whitespace
/// and lowercase currency codes. The bank rejects both.
///
/// **BUG THIS CATCHES**: Would catch if trimming or uppercasing is dropped.
#[test]
fn given_untrimmed_fields_when_building_then_normalizes_them() {
    // GIVEN: Fields with whitespace and lowercase currency
    let builder = complete_builder()
        .with_reference("  INV-1  ")
        .with_currency(" eur ")
        .with_beneficiary_name("  ")
        .with_notes(" March rent ");

    // WHEN: Building
    let instruction = builder.build().expect("normalized instruction should build");

    // THEN: Fields are cleaned up; blank optionals become None
    assert_eq!(instruction.reference, "INV-1");
    assert_eq!(instruction.currency, "EUR");
    assert_eq!(instruction.beneficiary_name, None);
    assert_eq!(instruction.notes.as_deref(), Some("March rent"));
}

#[test]
fn given_all_valid_fields_when_building_then_returns_instruction() {
    let instruction = complete_builder()
        .with_beneficiary_name("Acme Ltd")
        .with_source_bic("HEBACY2N")
        .with_destination_bic("BCYPCY2N")
        .build()
        .expect("complete builder should build");

    assert_eq!(instruction.amount, dec!(100));
    assert_eq!(instruction.source_bic.as_deref(), Some("HEBACY2N"));
    assert_eq!(instruction.destination_bic.as_deref(), Some("BCYPCY2N"));
    assert_eq!(instruction.beneficiary_name.as_deref(), Some("Acme Ltd"));
}

/// **VALUE**: Verifies that an empty reference is rejected.
///
/// **WHY THIS MATTERS**: The reference is how the beneficiary and our own
/// reconciliation match the transfer to an invoice.
///
/// **BUG THIS CATCHES**: Would catch if only presence (not emptiness) is checked.
#[test]
fn given_empty_reference_when_building_then_returns_validation_error() {
    let result = complete_builder().with_reference("   ").build();

    assert_eq!(result.unwrap_err().field(), "reference");
}
