//! Shared fixtures for connector integration tests.
//!
//! Every test runs against its own wiremock server standing in for both
//! the bank's OAuth host and its API host.

use bank_connector::authorization::AuthorizationFlow;
use bank_connector::bank_api::{BankApiClient, RetryPolicy};
use bank_connector::config::{EndpointOverrides, ProviderEndpoints};
use bank_connector::token_store::{MemoryCredentialStore, TokenStore};

use models::{BankConnection, BankProvider, Credential};

use common::RedactedSecret;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use url::Url;
use wiremock::MockServer;

pub const CONNECTION_NAME: &str = "hellenic";
pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "test-secret";
/// `base64("test-client:test-secret")`
pub const BASIC_AUTH_HEADER: &str = "Basic dGVzdC1jbGllbnQ6dGVzdC1zZWNyZXQ=";
pub const REDIRECT_URI: &str = "https://erp.example.com/callback/hellenic";
pub const IBAN: &str = "CY17002001280000001200527600";

pub fn connection_with(client_id: &str, client_secret: &str) -> Arc<BankConnection> {
    Arc::new(BankConnection {
        name: CONNECTION_NAME.to_string(),
        title: "Hellenic Bank".to_string(),
        provider: BankProvider::HellenicBank,
        is_sandbox: true,
        client_id: client_id.to_string(),
        client_secret: RedactedSecret::new(client_secret),
        parent_account: None,
    })
}

pub fn connection() -> Arc<BankConnection> {
    connection_with(CLIENT_ID, CLIENT_SECRET)
}

pub fn overrides(server: &MockServer) -> EndpointOverrides {
    EndpointOverrides {
        auth_base_url: Some(server.uri()),
        api_base_url: Some(server.uri()),
        scopes: None,
    }
}

pub fn endpoints(server: &MockServer) -> ProviderEndpoints {
    ProviderEndpoints::resolve(BankProvider::HellenicBank, true, Some(&overrides(server)))
        .expect("Failed to resolve endpoints")
}

pub fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to build HTTP client")
}

/// Three attempts, millisecond delays.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    }
}

pub fn redirect_uri() -> Url {
    Url::parse(REDIRECT_URI).expect("valid redirect uri")
}

pub fn valid_credential(code: &str) -> Credential {
    Credential::issue(
        RedactedSecret::new(format!("access-{code}")),
        code,
        Utc::now(),
        chrono::Duration::hours(1),
        vec!["b2b.account.list".to_string()],
    )
}

pub fn expired_credential(code: &str) -> Credential {
    Credential::issue(
        RedactedSecret::new(format!("access-{code}")),
        code,
        Utc::now() - chrono::Duration::hours(2),
        chrono::Duration::hours(1),
        Vec::new(),
    )
}

pub fn token_store(initial: Option<Credential>) -> Arc<TokenStore> {
    let store = TokenStore::new(CONNECTION_NAME, Arc::new(MemoryCredentialStore::new()));
    if let Some(credential) = initial {
        store.replace(credential).expect("Failed to seed credential");
    }
    Arc::new(store)
}

pub fn api_client(
    server: &MockServer,
    tokens: Arc<TokenStore>,
    retry: RetryPolicy,
    timeout: Duration,
) -> Arc<BankApiClient> {
    Arc::new(BankApiClient::new(
        connection(),
        endpoints(server),
        http_client(timeout),
        tokens,
        retry,
    ))
}

pub fn authorization_flow(
    server: &MockServer,
    connection: Arc<BankConnection>,
    tokens: Arc<TokenStore>,
) -> AuthorizationFlow {
    AuthorizationFlow::new(
        connection,
        endpoints(server),
        http_client(Duration::from_secs(5)),
        tokens,
    )
}

/// Value of query parameter `key` in `url`.
pub fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or_default()
}
