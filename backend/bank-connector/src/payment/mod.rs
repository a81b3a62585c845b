//! Single wire-transfer submission.
//!
//! Exactly one attempt per call. A transfer that may or may not have
//! reached the bank is never resent; the caller decides after checking
//! with the bank.

pub mod rejection;

pub use rejection::rejection_messages;

use crate::CREDIT_TRANSFER_ENDPOINT;
use crate::bank_api::{ApiRequest, BankApiClient};
use crate::error::bank_api::BankApiError;
use crate::error::payment::PaymentError;

use models::{ModelError, PaymentInstruction, PaymentResult};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use log::{info, warn};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Value, json};

const EXECUTION_DATE_FORMAT: &str = "%Y-%m-%d";

/// Where banks put the id of an accepted transfer, most specific first.
const REFERENCE_POINTERS: [&str; 6] = [
    "/payload/paymentId",
    "/payload/transactionId",
    "/payload/id",
    "/paymentId",
    "/transactionId",
    "/id",
];

pub struct PaymentInitiator {
    client: Arc<BankApiClient>,
}

impl PaymentInitiator {
    pub fn new(client: Arc<BankApiClient>) -> Self {
        Self { client }
    }

    /// Submit one transfer.
    ///
    /// A bank refusal is `Ok` with `accepted: false`. Validation failures
    /// never reach the network; transport and authorization errors come
    /// back as `Err` after the single attempt.
    pub async fn submit(
        &self,
        instruction: &PaymentInstruction,
    ) -> Result<PaymentResult, PaymentError> {
        instruction.validate()?;

        let body = transfer_body(instruction)?;
        let request = ApiRequest::post(CREDIT_TRANSFER_ENDPOINT, body);
        let name = self.client.connection_name();

        match self.client.call_once(&request).await {
            Ok(response) => {
                let reference = provider_reference(&response.body);
                info!(
                    "Payment '{}' accepted for '{}' (reference {:?})",
                    instruction.reference, name, reference
                );
                Ok(PaymentResult::accepted(reference))
            }
            Err(BankApiError::ProviderRejected {
                status_code, body, ..
            }) => {
                let messages = rejection_messages(&body);
                warn!(
                    "Payment '{}' rejected for '{}': HTTP {} ({} reason(s))",
                    instruction.reference,
                    name,
                    status_code,
                    messages.len()
                );
                Ok(PaymentResult::rejected(status_code.0, messages))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Provider JSON for a credit transfer. Absent optionals are left out.
///
/// The bank takes `amount` as a JSON number. An amount that does not survive
/// the trip through `f64` unchanged is refused rather than rounded.
#[track_caller]
pub fn transfer_body(instruction: &PaymentInstruction) -> Result<Value, ModelError> {
    let Some(amount) = exact_f64(instruction.amount) else {
        return Err(ModelError::Validation {
            field: "amount",
            message: format!(
                "Amount {} cannot be sent to the bank without rounding",
                instruction.amount
            ),
            location: ErrorLocation::from(Location::caller()),
        });
    };

    let mut body = Map::new();
    body.insert(
        "executionDate".to_string(),
        json!(instruction.execution_date.format(EXECUTION_DATE_FORMAT).to_string()),
    );
    body.insert("amount".to_string(), json!(amount));
    body.insert("debtorAccount".to_string(), json!(instruction.source_account));
    body.insert(
        "beneficiaryAccount".to_string(),
        json!(instruction.destination_account),
    );
    body.insert("currency".to_string(), json!(instruction.currency));
    body.insert("customerReference".to_string(), json!(instruction.reference));
    body.insert(
        "paymentNotes".to_string(),
        json!(instruction.notes.as_deref().unwrap_or(instruction.reference.as_str())),
    );

    let optionals = [
        ("beneficiaryName", &instruction.beneficiary_name),
        ("debtorBic", &instruction.source_bic),
        ("beneficiaryBankBic", &instruction.destination_bic),
    ];
    for (key, value) in optionals {
        if let Some(value) = value {
            body.insert(key.to_string(), json!(value));
        }
    }

    Ok(Value::Object(body))
}

/// `amount` as `f64`, only if reading the `f64` back gives the same value.
pub fn exact_f64(amount: Decimal) -> Option<f64> {
    let value = amount.to_f64().filter(|v| v.is_finite())?;
    let round_trip: Decimal = value.to_string().parse().ok()?;
    (round_trip == amount).then_some(value)
}

pub fn provider_reference(body: &Value) -> Option<String> {
    REFERENCE_POINTERS
        .iter()
        .filter_map(|p| body.pointer(p))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}
