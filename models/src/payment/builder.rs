use crate::{ModelError, PaymentInstruction};

use common::ErrorLocation;

use std::panic::Location;

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Builder for creating validated PaymentInstruction instances.
///
/// Provides a fluent API for assembling an instruction from an accounting
/// payment record. Text fields are trimmed; the currency is uppercased.
#[derive(Debug, Default)]
pub struct PaymentInstructionBuilder {
    source_account: Option<String>,
    destination_account: Option<String>,
    amount: Option<Decimal>,
    currency: Option<String>,
    reference: Option<String>,
    execution_date: Option<NaiveDate>,
    beneficiary_name: Option<String>,
    source_bic: Option<String>,
    destination_bic: Option<String>,
    notes: Option<String>,
}

impl PaymentInstructionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_account(mut self, iban: impl Into<String>) -> Self {
        self.source_account = Some(iban.into());
        self
    }

    pub fn with_destination_account(mut self, iban: impl Into<String>) -> Self {
        self.destination_account = Some(iban.into());
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_execution_date(mut self, date: NaiveDate) -> Self {
        self.execution_date = Some(date);
        self
    }

    pub fn with_beneficiary_name(mut self, name: impl Into<String>) -> Self {
        self.beneficiary_name = Some(name.into());
        self
    }

    pub fn with_source_bic(mut self, bic: impl Into<String>) -> Self {
        self.source_bic = Some(bic.into());
        self
    }

    pub fn with_destination_bic(mut self, bic: impl Into<String>) -> Self {
        self.destination_bic = Some(bic.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Build the PaymentInstruction with validation.
    #[track_caller]
    pub fn build(self) -> Result<PaymentInstruction, ModelError> {
        let source_account = self.source_account.ok_or_else(|| ModelError::Validation {
            field: "source_account",
            message: String::from("Source account is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let destination_account =
            self.destination_account
                .ok_or_else(|| ModelError::Validation {
                    field: "destination_account",
                    message: String::from("Destination account is required"),
                    location: ErrorLocation::from(Location::caller()),
                })?;

        let amount = self.amount.ok_or_else(|| ModelError::Validation {
            field: "amount",
            message: String::from("Amount is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let currency = self.currency.ok_or_else(|| ModelError::Validation {
            field: "currency",
            message: String::from("Currency is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let reference = self.reference.ok_or_else(|| ModelError::Validation {
            field: "reference",
            message: String::from("Reference is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let execution_date = self.execution_date.ok_or_else(|| ModelError::Validation {
            field: "execution_date",
            message: String::from("Execution date is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let instruction = PaymentInstruction {
            source_account: source_account.trim().to_string(),
            destination_account: destination_account.trim().to_string(),
            amount,
            currency: currency.trim().to_ascii_uppercase(),
            reference: reference.trim().to_string(),
            execution_date,
            beneficiary_name: non_blank(self.beneficiary_name),
            source_bic: non_blank(self.source_bic),
            destination_bic: non_blank(self.destination_bic),
            notes: non_blank(self.notes),
        };

        instruction.validate()?;

        Ok(instruction)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
