//! Gateway fixtures: a registry pointed at a wiremock bank and the router
//! built over it.

use bank_gateway::routes::build_router;
use bank_gateway::state::GatewayState;

use bank_connector::config::{ConnectionConfig, ConnectorConfig, EndpointOverrides, LoadedSecrets};
use bank_connector::registry::ConnectorRegistry;
use bank_connector::token_store::{CredentialStore, MemoryCredentialStore};

use models::{BankProvider, Credential};

use common::RedactedSecret;

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response};
use chrono::{Duration, Utc};
use serde_json::Value;
use tower::util::ServiceExt;
use wiremock::MockServer;

pub const CONNECTION_NAME: &str = "hellenic";
pub const IBAN: &str = "CY17002001280000001200527600";

pub fn config_for(server: &MockServer) -> ConnectorConfig {
    ConnectorConfig {
        public_base_url: "https://erp.example.com".to_string(),
        connections: vec![ConnectionConfig {
            name: CONNECTION_NAME.to_string(),
            title: "Hellenic Bank".to_string(),
            provider: BankProvider::HellenicBank,
            is_sandbox: true,
            client_id: "test-client".to_string(),
            client_secret_env: "HELLENIC_CLIENT_SECRET".to_string(),
            parent_account: None,
            endpoints: Some(EndpointOverrides {
                auth_base_url: Some(server.uri()),
                api_base_url: Some(server.uri()),
                scopes: None,
            }),
        }],
        ..Default::default()
    }
}

pub fn valid_credential() -> Credential {
    Credential::issue(
        RedactedSecret::new("seeded-token"),
        "seeded-code",
        Utc::now(),
        Duration::hours(1),
        Vec::new(),
    )
}

/// Router over a one-connection registry, optionally already authorized.
pub fn app(server: &MockServer, credential: Option<Credential>) -> Router {
    let store = MemoryCredentialStore::new();
    if let Some(credential) = credential {
        store
            .set(CONNECTION_NAME, &credential)
            .expect("Failed to seed credential");
    }

    let mut secrets = LoadedSecrets::default();
    secrets.secrets.insert(
        CONNECTION_NAME.to_string(),
        RedactedSecret::new("test-secret"),
    );

    let registry = ConnectorRegistry::from_config(&config_for(server), secrets, Arc::new(store))
        .expect("Failed to build registry");

    build_router(GatewayState::new(registry))
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request")
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(
        app,
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request"),
    )
    .await
}

pub async fn post_json(app: &Router, uri: &str, body: &Value) -> Response<Body> {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request"),
    )
    .await
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body should be JSON")
}

pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or_default()
}
