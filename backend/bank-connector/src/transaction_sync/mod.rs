//! Statement retrieval for bank reconciliation.
//!
//! One sync covers an inclusive date range of one account and walks every
//! page the bank offers. Lines are returned in the order received; the
//! ledger owns deduplication across syncs.

use crate::ACCOUNT_REPORT_ENDPOINT;
use crate::bank_api::{ApiRequest, BankApiClient};
use crate::error::bank_api::BankApiError;
use crate::error::sync::SyncError;

use models::TransactionRecord;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

const PROVIDER_DATE_FORMAT: &str = "%Y%m%d";
const START_OF_DAY: &str = "0000";
const END_OF_DAY: &str = "2359";

/// Pages one sync may request before giving up on the statement.
pub const MAX_STATEMENT_PAGES: usize = 200;

/// Statement line as the bank sends it. Only the fields the ledger needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementLine {
    #[serde(alias = "id", deserialize_with = "string_or_number")]
    transaction_id: String,
    #[serde(alias = "valueDate")]
    transaction_value_date: String,
    #[serde(alias = "amount", deserialize_with = "decimal_from_any")]
    transaction_amount: Decimal,
    #[serde(alias = "transactionCurrency", default)]
    currency: String,
    #[serde(default)]
    customer_reference: Option<String>,
    #[serde(default)]
    payment_notes: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn decimal_from_any<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = string_or_number(deserializer)?;
    raw.trim().parse().map_err(serde::de::Error::custom)
}

/// Accepts `YYYY-MM-DD`, an ISO datetime, or the bank's `YYYYMMDD`.
pub(crate) fn parse_value_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);

    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw.get(..8).unwrap_or(raw), PROVIDER_DATE_FORMAT).ok())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct TransactionSync {
    client: Arc<BankApiClient>,
    max_pages: usize,
}

impl TransactionSync {
    pub fn new(client: Arc<BankApiClient>) -> Self {
        Self {
            client,
            max_pages: MAX_STATEMENT_PAGES,
        }
    }

    /// Lower or raise the page budget. At least one page is always allowed.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Every statement line of `account_ref` between `from_date` and
    /// `to_date`, both inclusive.
    ///
    /// # Errors
    ///
    /// `InvalidRange` before any call if `from_date > to_date`; `PageLimit`
    /// if the bank still offers a next page after `max_pages` pages, rather
    /// than returning a partial statement. API errors pass through unchanged.
    pub async fn fetch(
        &self,
        account_ref: &str,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<TransactionRecord>, SyncError> {
        if from_date > to_date {
            return Err(SyncError::invalid_range(from_date, to_date));
        }

        let name = self.client.connection_name().to_string();
        let date_from = format!("{}{}", from_date.format(PROVIDER_DATE_FORMAT), START_OF_DAY);
        let date_to = format!("{}{}", to_date.format(PROVIDER_DATE_FORMAT), END_OF_DAY);

        let mut records = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut seen_tokens = HashSet::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut request = ApiRequest::get(ACCOUNT_REPORT_ENDPOINT)
                .with_query("account", account_ref)
                .with_query("dateFrom", &date_from)
                .with_query("dateTo", &date_to);
            if let Some(ref token) = page_token {
                request = request.with_query("pageToken", token);
            }

            let response = self.client.call(&request).await?;
            pages += 1;

            let payload = response.body.get("payload");
            let lines = payload
                .and_then(|p| p.get("transactions"))
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();

            debug!(
                "Statement page {} for '{}' carried {} line(s)",
                pages,
                name,
                lines.len()
            );

            for line in lines {
                let record = to_record(&name, line)?;
                if seen_ids.insert(record.external_id.clone()) {
                    records.push(record);
                } else {
                    warn!(
                        "Duplicate transaction id '{}' in sync for '{}', keeping first",
                        record.external_id, name
                    );
                }
            }

            let next = payload
                .and_then(|p| p.get("nextPageToken"))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string);

            match next {
                None => break,
                Some(token) if !seen_tokens.insert(token.clone()) => {
                    warn!(
                        "Bank repeated page token for '{}', stopping pagination after {} page(s)",
                        name, pages
                    );
                    break;
                }
                Some(_) if pages >= self.max_pages => {
                    warn!(
                        "Statement for '{}' account {} exceeded {} page(s), aborting sync",
                        name, account_ref, self.max_pages
                    );
                    return Err(SyncError::page_limit(name, pages));
                }
                Some(token) => page_token = Some(token),
            }
        }

        info!(
            "Synced {} transaction(s) for '{}' account {} ({} to {}, {} page(s))",
            records.len(),
            name,
            account_ref,
            from_date,
            to_date,
            pages
        );
        Ok(records)
    }
}

fn to_record(connection: &str, raw: &Value) -> Result<TransactionRecord, BankApiError> {
    let line: StatementLine = serde_json::from_value(raw.clone()).map_err(|e| {
        BankApiError::invalid_response(connection, format!("Malformed statement line: {e}"))
    })?;

    let value_date = parse_value_date(&line.transaction_value_date).ok_or_else(|| {
        BankApiError::invalid_response(
            connection,
            format!("Unrecognized value date '{}'", line.transaction_value_date),
        )
    })?;

    Ok(TransactionRecord {
        external_id: line.transaction_id,
        value_date,
        amount: line.transaction_amount,
        currency: line.currency.trim().to_uppercase(),
        counterparty_reference: non_blank(line.customer_reference),
        description: non_blank(line.payment_notes),
        raw_payload: raw.clone(),
    })
}
