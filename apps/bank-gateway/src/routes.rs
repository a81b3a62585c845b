//! HTTP surface over the connector registry.
//!
//! | Method | Path                               | Registry call            |
//! |--------|------------------------------------|--------------------------|
//! | GET    | `/health`                          |                          |
//! | GET    | `/connections`                     | `names`                  |
//! | GET    | `/connections/:name/authorize`     | `initiate_authorization` |
//! | GET    | `/callback/:name?code&state`       | `handle_callback`        |
//! | GET    | `/connections/:name/status`        | `get_token_status`       |
//! | GET    | `/connections/:name/accounts`      | `list_accounts`          |
//! | POST   | `/connections/:name/transactions`  | `sync_transactions`      |
//! | POST   | `/connections/:name/payments`      | `submit_payment`         |

use crate::error::GatewayError;
use crate::state::GatewayState;

use models::{BankAccount, PaymentInstruction, PaymentResult, TokenStatus, TransactionRecord};

use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use log::{debug, info};
use serde::Deserialize;
use serde_json::{Value, json};

pub const SERVICE_NAME: &str = "bank-gateway";

pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/connections", get(list_connections))
        .route("/connections/:name/authorize", get(authorize))
        .route("/callback/:name", get(callback))
        .route("/connections/:name/status", get(status))
        .route("/connections/:name/accounts", get(accounts))
        .route("/connections/:name/transactions", post(transactions))
        .route("/connections/:name/payments", post(payments))
        .with_state(state)
}

/// Query string the bank appends to the redirect URI.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub state: String,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub account: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_connections(State(state): State<GatewayState>) -> Json<Vec<String>> {
    Json(state.registry().names().map(str::to_string).collect())
}

async fn authorize(
    State(state): State<GatewayState>,
    Path(name): Path<String>,
) -> Result<Redirect, GatewayError> {
    let url = state.registry().initiate_authorization(&name).await?;
    info!("Redirecting '{}' to bank consent page", name);
    Ok(Redirect::to(url.as_str()))
}

async fn callback(
    State(state): State<GatewayState>,
    Path(name): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<TokenStatus>, GatewayError> {
    if let Some(error) = params.error {
        return Err(GatewayError::bad_request(format!(
            "Bank declined authorization for '{}': {} {}",
            name,
            error,
            params.error_description.unwrap_or_default()
        )));
    }

    let status = state
        .registry()
        .handle_callback(&name, &params.code, &params.state)
        .await?;
    info!("Connection '{}' authorized", name);
    Ok(Json(status))
}

async fn status(
    State(state): State<GatewayState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, GatewayError> {
    let registry = state.registry();
    let credential_state = registry.credential_state(&name)?;
    let token = registry.get_token_status(&name)?;

    Ok(Json(json!({
        "connection": name,
        "state": credential_state,
        "token": token,
    })))
}

async fn accounts(
    State(state): State<GatewayState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<BankAccount>>, GatewayError> {
    Ok(Json(state.registry().list_accounts(&name).await?))
}

async fn transactions(
    State(state): State<GatewayState>,
    Path(name): Path<String>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<Vec<TransactionRecord>>, GatewayError> {
    debug!(
        "Sync requested for '{}' account {} ({} to {})",
        name, request.account, request.from_date, request.to_date
    );

    let records = state
        .registry()
        .sync_transactions(&name, &request.account, request.from_date, request.to_date)
        .await?;
    Ok(Json(records))
}

/// A bank refusal is still `200` with `accepted: false`.
async fn payments(
    State(state): State<GatewayState>,
    Path(name): Path<String>,
    Json(instruction): Json<PaymentInstruction>,
) -> Result<Json<PaymentResult>, GatewayError> {
    Ok(Json(
        state.registry().submit_payment(&name, &instruction).await?,
    ))
}
