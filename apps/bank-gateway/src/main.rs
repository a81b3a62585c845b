use bank_gateway::error::GatewayError;
use bank_gateway::logger::initialize as LoggerInitialize;
use bank_gateway::routes::build_router;
use bank_gateway::state::GatewayState;

use bank_connector::config::{ConnectorConfig, default_config_dir, load_client_secrets};
use bank_connector::error::ConnectorError;
use bank_connector::registry::ConnectorRegistry;
use bank_connector::token_store::JsonFileCredentialStore;

use std::env;
use std::fs::create_dir_all;
use std::sync::Arc;

use log::{info, warn};
use tokio::net::TcpListener;

/// Env var overriding the listen address.
const GATEWAY_ADDR_ENV: &str = "BANK_GATEWAY_ADDR";

const DEFAULT_GATEWAY_ADDR: &str = "127.0.0.1:8085";

const LOG_DIR_NAME: &str = "logs";

#[tokio::main]
async fn main() -> Result<(), GatewayError> {
    let config_dir = default_config_dir().map_err(ConnectorError::from)?;

    let log_dir = config_dir.join(LOG_DIR_NAME);
    create_dir_all(&log_dir).map_err(|e| {
        GatewayError::gateway(format!(
            "Failed to create log directory {}: {e}",
            log_dir.display()
        ))
    })?;

    // Logger first so config problems end up in the log file
    LoggerInitialize(&log_dir)?;

    info!("Bank gateway starting");
    info!("Config directory: {}", config_dir.display());

    let config = ConnectorConfig::load(&config_dir).map_err(ConnectorError::from)?;
    let secrets = load_client_secrets(&config);
    for name in &secrets.missing {
        warn!("Connection '{name}' has no client secret; code exchange will fail");
    }

    let store = Arc::new(JsonFileCredentialStore::new(config.credential_dir(&config_dir)));
    info!("Credential directory: {}", store.dir().display());

    let registry = ConnectorRegistry::from_config(&config, secrets, store)?;
    let app = build_router(GatewayState::new(registry));

    let addr = env::var(GATEWAY_ADDR_ENV).unwrap_or_else(|_| DEFAULT_GATEWAY_ADDR.to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| GatewayError::gateway(format!("Failed to bind {addr}: {e}")))?;

    info!("Listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| GatewayError::gateway(format!("Server error: {e}")))?;

    Ok(())
}
