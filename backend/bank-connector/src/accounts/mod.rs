use crate::ACCOUNT_LIST_ENDPOINT;
use crate::bank_api::{ApiRequest, BankApiClient};
use crate::error::bank_api::BankApiError;

use models::BankAccount;

use std::sync::Arc;

use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountEntry {
    #[serde(default)]
    account_name: String,
    #[serde(default)]
    account_number: String,
    #[serde(default)]
    iban: String,
    #[serde(default)]
    account_currency_codes: Option<Value>,
}

impl AccountEntry {
    /// The bank sends either a single code or a list; the first one wins.
    fn currency(&self) -> String {
        match self.account_currency_codes {
            Some(Value::String(ref code)) => code.trim().to_uppercase(),
            Some(Value::Array(ref codes)) => codes
                .iter()
                .find_map(Value::as_str)
                .map(|c| c.trim().to_uppercase())
                .unwrap_or_default(),
            _ => String::new(),
        }
    }
}

/// Accounts visible to a connection's credential.
pub struct AccountDirectory {
    client: Arc<BankApiClient>,
}

impl AccountDirectory {
    pub fn new(client: Arc<BankApiClient>) -> Self {
        Self { client }
    }

    pub async fn list_accounts(&self) -> Result<Vec<BankAccount>, BankApiError> {
        let name = self.client.connection_name();
        let response = self.client.call(&ApiRequest::get(ACCOUNT_LIST_ENDPOINT)).await?;

        let Some(entries) = response
            .body
            .pointer("/payload/accounts")
            .and_then(Value::as_array)
        else {
            debug!("Account list for '{}' carried no accounts", name);
            return Ok(Vec::new());
        };

        let accounts = entries
            .iter()
            .map(|raw| {
                let entry: AccountEntry = serde_json::from_value(raw.clone()).map_err(|e| {
                    BankApiError::invalid_response(name, format!("Malformed account entry: {e}"))
                })?;
                let currency = entry.currency();

                Ok(BankAccount {
                    name: entry.account_name,
                    number: entry.account_number,
                    iban: entry.iban,
                    currency,
                })
            })
            .collect::<Result<Vec<_>, BankApiError>>()?;

        info!("Listed {} account(s) for '{}'", accounts.len(), name);
        Ok(accounts)
    }
}
