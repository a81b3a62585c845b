//! Wire-transfer instruction and its outcome.

pub mod builder;

use crate::ErrorKind;
use crate::ModelError;

use common::ErrorLocation;

use std::panic::Location;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single wire transfer to submit on behalf of an accounting payment record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInstruction {
    /// Debtor IBAN.
    pub source_account: String,
    /// Beneficiary IBAN.
    pub destination_account: String,
    pub amount: Decimal,
    pub currency: String,
    /// Customer reference, echoed on the beneficiary's statement.
    pub reference: String,
    pub execution_date: NaiveDate,
    #[serde(default)]
    pub beneficiary_name: Option<String>,
    #[serde(default)]
    pub source_bic: Option<String>,
    #[serde(default)]
    pub destination_bic: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PaymentInstruction {
    /// Local precondition check; runs before anything reaches the bank.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Validation`] naming the first offending field.
    #[track_caller]
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.amount <= Decimal::ZERO {
            return Err(ModelError::Validation {
                field: "amount",
                message: format!("Amount must be positive, got {}", self.amount),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if self.currency.trim().is_empty() {
            return Err(ModelError::Validation {
                field: "currency",
                message: String::from("Currency is required"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if !is_currency_code(&self.currency) {
            return Err(ModelError::Validation {
                field: "currency",
                message: format!("Invalid currency code: {}", self.currency),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let required = [
            ("source_account", &self.source_account),
            ("destination_account", &self.destination_account),
            ("reference", &self.reference),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ModelError::Validation {
                    field,
                    message: format!("{field} cannot be empty"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        if self.source_account.trim() == self.destination_account.trim() {
            return Err(ModelError::Validation {
                field: "destination_account",
                message: String::from("Destination account must differ from source account"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(())
    }
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())
}

/// Why the bank refused a well-formed payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRejection {
    pub kind: ErrorKind,
    pub status_code: u16,
    /// Human-readable reasons extracted from the bank's error body.
    pub messages: Vec<String>,
}

/// Outcome of one submission attempt.
///
/// A business refusal (insufficient funds, unknown beneficiary) is a
/// result, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentResult {
    pub accepted: bool,
    pub provider_reference: Option<String>,
    pub error: Option<PaymentRejection>,
}

impl PaymentResult {
    pub fn accepted(provider_reference: Option<String>) -> Self {
        Self {
            accepted: true,
            provider_reference,
            error: None,
        }
    }

    pub fn rejected(status_code: u16, messages: Vec<String>) -> Self {
        Self {
            accepted: false,
            provider_reference: None,
            error: Some(PaymentRejection {
                kind: ErrorKind::ProviderRejected,
                status_code,
                messages,
            }),
        }
    }
}
