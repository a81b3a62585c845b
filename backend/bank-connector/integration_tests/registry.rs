use crate::helpers::{CONNECTION_NAME, overrides, query_value};

use bank_connector::config::{ConnectionConfig, ConnectorConfig, LoadedSecrets};
use bank_connector::registry::ConnectorRegistry;
use bank_connector::token_store::{CredentialStore, JsonFileCredentialStore, MemoryCredentialStore};

use models::{BankProvider, CredentialState, ErrorKind};

use common::RedactedSecret;

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ConnectorConfig {
    ConnectorConfig {
        public_base_url: "https://erp.example.com".to_string(),
        connections: vec![ConnectionConfig {
            name: CONNECTION_NAME.to_string(),
            title: "Hellenic Bank".to_string(),
            provider: BankProvider::HellenicBank,
            is_sandbox: true,
            client_id: "test-client".to_string(),
            client_secret_env: "HELLENIC_CLIENT_SECRET".to_string(),
            parent_account: Some("1200 - Bank".to_string()),
            endpoints: Some(overrides(server)),
        }],
        ..Default::default()
    }
}

fn secrets() -> LoadedSecrets {
    let mut loaded = LoadedSecrets::default();
    loaded.secrets.insert(
        CONNECTION_NAME.to_string(),
        RedactedSecret::new("test-secret"),
    );
    loaded
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token/exchange"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "registry-token",
            "expires_in": 1800
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn given_unknown_name_when_any_operation_called_then_unknown_connection() {
    // GIVEN
    let server = MockServer::start().await;
    let registry = ConnectorRegistry::from_config(
        &config_for(&server),
        secrets(),
        Arc::new(MemoryCredentialStore::new()),
    )
    .expect("registry");

    // WHEN / THEN
    assert_eq!(
        registry.get_token_status("missing").expect_err("unknown").kind(),
        ErrorKind::UnknownConnection
    );
    assert_eq!(
        registry
            .initiate_authorization("missing")
            .await
            .expect_err("unknown")
            .kind(),
        ErrorKind::UnknownConnection
    );
}

/// **VALUE**: A full authorization cycle makes the connection usable.
///
/// **WHY THIS MATTERS**: This is the path a human takes from "Authorize"
/// to a working bank feed; every layer has to line up.
///
/// **BUG THIS CATCHES**: Would catch the registry using a redirect URI that
/// differs from the one in the consent URL, or status not reflecting the
/// new credential.
#[tokio::test]
async fn given_configured_connection_when_authorized_then_status_valid_and_api_usable() {
    // GIVEN: A bank with token and account endpoints
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/b2b/account/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"payload": {"accounts": []}})))
        .expect(1)
        .mount(&server)
        .await;

    let registry = ConnectorRegistry::from_config(
        &config_for(&server),
        secrets(),
        Arc::new(MemoryCredentialStore::new()),
    )
    .expect("registry");
    assert_eq!(
        registry.credential_state(CONNECTION_NAME).expect("state"),
        CredentialState::NoCredential
    );

    // WHEN: Initiating and completing the callback
    let url = registry
        .initiate_authorization(CONNECTION_NAME)
        .await
        .expect("authorize url");
    let state = query_value(&url, "state").expect("state");
    let status = registry
        .handle_callback(CONNECTION_NAME, "code-1", &state)
        .await
        .expect("callback");

    // THEN
    assert_eq!(
        query_value(&url, "redirect_uri").as_deref(),
        Some("https://erp.example.com/callback/hellenic")
    );
    assert!(status.valid);
    assert_eq!(status.scopes.len(), 9, "Requested scopes used when none granted");
    assert_eq!(
        registry.credential_state(CONNECTION_NAME).expect("state"),
        CredentialState::Valid
    );
    assert!(
        registry
            .list_accounts(CONNECTION_NAME)
            .await
            .expect("accounts")
            .is_empty()
    );
}

/// **VALUE**: Credentials survive a registry rebuild through the file store.
///
/// **WHY THIS MATTERS**: A gateway restart must not force every connection
/// back through human consent.
///
/// **BUG THIS CATCHES**: Would catch the registry not loading stored blobs.
#[tokio::test]
async fn given_file_store_when_registry_rebuilt_then_credential_restored() {
    // GIVEN: A completed authorization persisted to disk
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    let dir = tempfile::tempdir().expect("temp dir");
    let store: Arc<dyn CredentialStore> = Arc::new(JsonFileCredentialStore::new(dir.path()));

    let registry = ConnectorRegistry::from_config(&config_for(&server), secrets(), Arc::clone(&store))
        .expect("registry");
    let url = registry
        .initiate_authorization(CONNECTION_NAME)
        .await
        .expect("authorize url");
    let state = query_value(&url, "state").expect("state");
    registry
        .handle_callback(CONNECTION_NAME, "code-1", &state)
        .await
        .expect("callback");

    // WHEN: A new registry is built over the same directory
    let rebuilt = ConnectorRegistry::from_config(&config_for(&server), secrets(), store)
        .expect("registry");

    // THEN
    let handle = rebuilt.connection(CONNECTION_NAME).expect("handle");
    let credential = handle.tokens.current().expect("credential restored");
    assert_eq!(credential.access_token.as_str(), "registry-token");
    assert!(rebuilt.get_token_status(CONNECTION_NAME).expect("status").valid);
}

#[tokio::test]
async fn given_missing_secret_when_callback_handled_then_config_error() {
    // GIVEN: No secret loaded for the connection
    let server = MockServer::start().await;
    let registry = ConnectorRegistry::from_config(
        &config_for(&server),
        LoadedSecrets::default(),
        Arc::new(MemoryCredentialStore::new()),
    )
    .expect("registry");
    let url = registry
        .initiate_authorization(CONNECTION_NAME)
        .await
        .expect("authorize url");
    let state = query_value(&url, "state").expect("state");

    // WHEN
    let result = registry.handle_callback(CONNECTION_NAME, "code-1", &state).await;

    // THEN
    assert_eq!(result.expect_err("must fail").kind(), ErrorKind::Config);
}
