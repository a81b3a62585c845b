//! OAuth2 bank connector.
//!
//! Authorizes against a bank's B2B API, keeps one credential per configured
//! connection, pulls statement lines for reconciliation and submits single
//! wire transfers. The [`registry::ConnectorRegistry`] is the surface the
//! rest of the system talks to.

pub mod accounts;
pub mod authorization;
pub mod bank_api;
pub mod config;
pub mod error;
pub mod payment;
pub mod registry;
pub mod token_store;
pub mod transaction_sync;

#[cfg(test)]
mod tests;

pub const HELLENIC_SANDBOX_AUTH_URL: &str = "https://sandbox-oauth.hellenicbank.com";
pub const HELLENIC_SANDBOX_API_URL: &str = "https://sandbox-apis.hellenicbank.com";
pub const HELLENIC_PRODUCTION_AUTH_URL: &str = "https://oauthprod.hellenicbank.com";
pub const HELLENIC_PRODUCTION_API_URL: &str = "https://apisprod.hellenicbank.com";

pub const AUTHORIZE_PATH: &str = "oauth2/auth";
pub const TOKEN_EXCHANGE_PATH: &str = "token/exchange";

pub const CLIENT_ID_HEADER: &str = "x-client-id";

const B2B_API_PREFIX: &str = "v1/b2b/";
pub const ACCOUNT_LIST_ENDPOINT: &str = const_format::concatcp!(B2B_API_PREFIX, "account/list");
pub const ACCOUNT_REPORT_ENDPOINT: &str =
    const_format::concatcp!(B2B_API_PREFIX, "account/report");
pub const CREDIT_TRANSFER_ENDPOINT: &str =
    const_format::concatcp!(B2B_API_PREFIX, "credit/transfer");

/// Scopes requested on every authorization, in this order.
pub const HELLENIC_SCOPES: [&str; 9] = [
    "b2b.account.details",
    "b2b.credit.transfer.mass",
    "b2b.account.list",
    "b2b.report.account.statements",
    "b2b.credit.transfer.cancel",
    "b2b.report.credit.transfer.single",
    "b2b.credit.transfer.single",
    "b2b.funds.availability",
    "b2b.report.credit.transfer.mass",
];
