use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

/// One normalized bank statement line.
///
/// Not persisted by the connector; handed to the ledger, which owns
/// deduplication across syncs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    /// Unique within one sync response.
    pub external_id: String,
    pub value_date: NaiveDate,
    /// Signed: positive is a deposit, negative a withdrawal.
    pub amount: Decimal,
    pub currency: String,
    pub counterparty_reference: Option<String>,
    pub description: Option<String>,
    /// Statement line as the bank sent it, kept for audit.
    pub raw_payload: Value,
}

impl TransactionRecord {
    pub fn is_deposit(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }
}
