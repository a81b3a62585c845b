//! Domain models for the bank connector.
//!
//! Pure data structures: bank connections, OAuth credentials, statement
//! lines, payment instructions and their outcomes. The only logic here is
//! what follows from the data itself (credential validity, instruction
//! validation). No I/O.

pub mod account;
pub mod connection;
pub mod credential;
pub mod error;
pub mod payment;
pub mod transaction;

pub use account::BankAccount;
pub use connection::{BankConnection, BankProvider};
pub use credential::{Credential, CredentialState, TokenStatus};
pub use error::error_kind::ErrorKind;
pub use error::model_error::ModelError;
pub use payment::builder::PaymentInstructionBuilder;
pub use payment::{PaymentInstruction, PaymentRejection, PaymentResult};
pub use transaction::TransactionRecord;

#[cfg(test)]
mod tests;
