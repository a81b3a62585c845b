//! Authenticated HTTP calls against a bank's B2B API.
//!
//! # Error mapping
//! - no credential, or an expired one: `NotAuthorized`, nothing sent
//! - 401 / 403: `AuthorizationExpired`, never retried
//! - timeouts, connection failures, 5xx: `Transport`, retried with backoff
//! - any other non-2xx: `ProviderRejected` with the bank's body
//! - 2xx that is not JSON: `InvalidResponse`

pub mod retry;

pub use retry::RetryPolicy;

use crate::CLIENT_ID_HEADER;
use crate::config::ProviderEndpoints;
use crate::error::bank_api::BankApiError;
use crate::token_store::TokenStore;

use models::{BankConnection, Credential};

use common::HttpStatusCode;

use std::sync::Arc;

use backoff::backoff::Backoff;
use chrono::Utc;
use log::{debug, trace, warn};
use reqwest::header::ACCEPT;
use reqwest::{Client, Method};
use serde_json::Value;

/// One logical API call, independent of attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base, e.g. `v1/b2b/account/list`.
    pub endpoint: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            endpoint: endpoint.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(endpoint: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            endpoint: endpoint.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: HttpStatusCode,
    /// `Value::Null` for an empty body.
    pub body: Value,
}

pub struct BankApiClient {
    connection: Arc<BankConnection>,
    endpoints: ProviderEndpoints,
    http: Client,
    tokens: Arc<TokenStore>,
    retry: RetryPolicy,
}

impl BankApiClient {
    pub fn new(
        connection: Arc<BankConnection>,
        endpoints: ProviderEndpoints,
        http: Client,
        tokens: Arc<TokenStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            connection,
            endpoints,
            http,
            tokens,
            retry,
        }
    }

    pub fn connection_name(&self) -> &str {
        &self.connection.name
    }

    /// Call with bounded retry on transient failures.
    pub async fn call(&self, request: &ApiRequest) -> Result<ApiResponse, BankApiError> {
        let mut backoff = self.retry.backoff();
        let mut attempt: u32 = 1;

        loop {
            let credential = self.authorized_credential()?;

            match self.send(request, &credential, attempt).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    match backoff.next_backoff() {
                        Some(delay) => {
                            warn!(
                                "{} {} for '{}' failed (attempt {}/{}), retrying after {:?}: {}",
                                request.method,
                                request.endpoint,
                                self.connection.name,
                                attempt,
                                self.retry.max_attempts,
                                delay,
                                e
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => return Err(e),
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Exactly one attempt; for calls that must not be repeated.
    pub async fn call_once(&self, request: &ApiRequest) -> Result<ApiResponse, BankApiError> {
        let credential = self.authorized_credential()?;
        self.send(request, &credential, 1).await
    }

    fn authorized_credential(&self) -> Result<Arc<Credential>, BankApiError> {
        let now = Utc::now();

        match self.tokens.current() {
            None => Err(BankApiError::not_authorized(
                &self.connection.name,
                "No credential; authorization required",
            )),
            Some(credential) if !TokenStore::is_valid(&credential, now) => {
                Err(BankApiError::not_authorized(
                    &self.connection.name,
                    format!("Credential expired at {}", credential.expires_at),
                ))
            }
            Some(credential) => Ok(credential),
        }
    }

    async fn send(
        &self,
        request: &ApiRequest,
        credential: &Credential,
        attempt: u32,
    ) -> Result<ApiResponse, BankApiError> {
        let name = &self.connection.name;

        let mut url = self.endpoints.api_url(&request.endpoint)?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(
                request
                    .query
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            );
        }

        trace!("{} {} (attempt {})", request.method, url, attempt);

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .bearer_auth(credential.access_token.as_str())
            .header(CLIENT_ID_HEADER, &self.connection.client_id)
            .header(ACCEPT, "application/json");

        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| BankApiError::from_reqwest(name, &e, attempt))?;

        let status = HttpStatusCode(response.status().as_u16());
        let text = response
            .text()
            .await
            .map_err(|e| BankApiError::from_reqwest(name, &e, attempt))?;

        if status.is_auth_failure() {
            warn!("Bank refused credential for '{}': HTTP {}", name, status);
            return Err(BankApiError::authorization_expired(name, status.0));
        }

        if status.is_server_error() {
            return Err(BankApiError::server_error(name, status.0, text, attempt));
        }

        if !status.is_success() {
            debug!("{} {} rejected for '{}': HTTP {}", request.method, request.endpoint, name, status);
            return Err(BankApiError::provider_rejected(name, status.0, text));
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| {
                BankApiError::invalid_response(name, format!("Response is not JSON: {e}"))
            })?
        };

        Ok(ApiResponse { status, body })
    }
}
