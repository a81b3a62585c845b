//! Shared building blocks for the bank connector workspace.
//!
//! This crate holds the small types every other crate leans on:
//! error location tracking, HTTP status categorization and redacted
//! secret handling. It has no knowledge of banks or OAuth.
//!
//! ## Architecture
//!
//! - **common** (this crate): Cross-cutting primitives
//! - **models**: Pure data structures for connections, credentials, transactions and payments
//! - **bank-connector**: OAuth2 flow, API client, statement sync and payments
//! - **bank-gateway**: HTTP surface wiring everything together

pub mod error;
pub mod http_status;
pub mod redacted_secret;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use http_status::HttpStatusCode;
pub use redacted_secret::RedactedSecret;

#[cfg(test)]
mod tests;
