//! HTTP gateway in front of the bank connector.
//!
//! `main.rs` wires config, secrets and the credential store into a
//! [`ConnectorRegistry`](bank_connector::registry::ConnectorRegistry) and
//! serves [`routes::build_router`]. Everything is exported for tests.

pub mod error;
pub mod logger;
pub mod routes;
pub mod state;

#[cfg(test)]
mod tests;
