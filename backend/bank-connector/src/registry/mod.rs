//! Collaborator call surface, keyed by connection name.
//!
//! Every configured connection gets its own token store, authorization
//! flow and API client. All connections share one HTTP client.

use crate::accounts::AccountDirectory;
use crate::authorization::AuthorizationFlow;
use crate::bank_api::{BankApiClient, RetryPolicy};
use crate::config::{ConnectorConfig, LoadedSecrets, build_http_client};
use crate::error::ConnectorError;
use crate::payment::PaymentInitiator;
use crate::token_store::{CredentialStore, TokenStore};
use crate::transaction_sync::TransactionSync;

use models::{
    BankAccount, BankConnection, CredentialState, PaymentInstruction, PaymentResult, TokenStatus,
    TransactionRecord,
};

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use log::info;
use url::Url;

/// Everything the connector holds for one connection.
pub struct ConnectionHandle {
    pub connection: Arc<BankConnection>,
    pub redirect_uri: Url,
    pub tokens: Arc<TokenStore>,
    pub authorization: AuthorizationFlow,
    pub client: Arc<BankApiClient>,
    pub transactions: TransactionSync,
    pub payments: PaymentInitiator,
    pub accounts: AccountDirectory,
}

pub struct ConnectorRegistry {
    connections: BTreeMap<String, ConnectionHandle>,
}

impl ConnectorRegistry {
    /// Wire up every configured connection.
    ///
    /// Stored credentials are loaded from `store`; secrets not present in
    /// `secrets` leave the connection unable to exchange codes until one
    /// is supplied.
    pub fn from_config(
        config: &ConnectorConfig,
        mut secrets: LoadedSecrets,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, ConnectorError> {
        config.validate()?;

        let http = build_http_client(&config.http)?;
        let retry = RetryPolicy::from_config(&config.retry);
        let mut connections = BTreeMap::new();

        for entry in &config.connections {
            let connection = Arc::new(entry.to_connection(secrets.take(&entry.name)));
            let endpoints = entry.endpoints()?;
            let redirect_uri = config.redirect_uri(&entry.name)?;
            let tokens = Arc::new(TokenStore::load(&entry.name, Arc::clone(&store))?);

            let authorization = AuthorizationFlow::new(
                Arc::clone(&connection),
                endpoints.clone(),
                http.clone(),
                Arc::clone(&tokens),
            );
            let client = Arc::new(BankApiClient::new(
                Arc::clone(&connection),
                endpoints,
                http.clone(),
                Arc::clone(&tokens),
                retry.clone(),
            ));

            info!(
                "Registered connection '{}' ({}, {})",
                entry.name,
                connection.provider.display_name(),
                if connection.is_sandbox { "sandbox" } else { "production" }
            );

            connections.insert(
                entry.name.clone(),
                ConnectionHandle {
                    connection,
                    redirect_uri,
                    tokens,
                    authorization,
                    transactions: TransactionSync::new(Arc::clone(&client)),
                    payments: PaymentInitiator::new(Arc::clone(&client)),
                    accounts: AccountDirectory::new(Arc::clone(&client)),
                    client,
                },
            );
        }

        Ok(Self { connections })
    }

    pub fn connection(&self, name: &str) -> Result<&ConnectionHandle, ConnectorError> {
        self.connections
            .get(name)
            .ok_or_else(|| ConnectorError::unknown_connection(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }

    pub fn redirect_uri(&self, name: &str) -> Result<&Url, ConnectorError> {
        Ok(&self.connection(name)?.redirect_uri)
    }

    /// Consent URL for the connection's own redirect URI.
    pub async fn initiate_authorization(&self, name: &str) -> Result<Url, ConnectorError> {
        let handle = self.connection(name)?;
        Ok(handle
            .authorization
            .build_authorization_url(&handle.redirect_uri)
            .await?)
    }

    pub async fn handle_callback(
        &self,
        name: &str,
        code: &str,
        state: &str,
    ) -> Result<TokenStatus, ConnectorError> {
        let handle = self.connection(name)?;
        let credential = handle.authorization.handle_callback(code, state).await?;
        Ok(credential.status_at(Utc::now()))
    }

    pub fn get_token_status(&self, name: &str) -> Result<TokenStatus, ConnectorError> {
        Ok(self.connection(name)?.tokens.status(Utc::now()))
    }

    pub fn credential_state(&self, name: &str) -> Result<CredentialState, ConnectorError> {
        Ok(self.connection(name)?.tokens.state(Utc::now()))
    }

    pub async fn sync_transactions(
        &self,
        name: &str,
        account_ref: &str,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<TransactionRecord>, ConnectorError> {
        let handle = self.connection(name)?;
        Ok(handle
            .transactions
            .fetch(account_ref, from_date, to_date)
            .await?)
    }

    pub async fn submit_payment(
        &self,
        name: &str,
        instruction: &PaymentInstruction,
    ) -> Result<PaymentResult, ConnectorError> {
        let handle = self.connection(name)?;
        Ok(handle.payments.submit(instruction).await?)
    }

    pub async fn list_accounts(&self, name: &str) -> Result<Vec<BankAccount>, ConnectorError> {
        let handle = self.connection(name)?;
        Ok(handle.accounts.list_accounts().await?)
    }
}
