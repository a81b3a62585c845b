use crate::error::bank_api::BankApiError;

use models::{ErrorKind, ModelError};

use thiserror::Error as ThisError;

/// System-level payment failures.
///
/// A bank refusing the transfer is not one of these; it comes back as a
/// rejected `PaymentResult`.
#[derive(Debug, ThisError)]
pub enum PaymentError {
    #[error(transparent)]
    Validation(#[from] ModelError),

    #[error(transparent)]
    Api(#[from] BankApiError),
}

impl PaymentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::Validation(_) => ErrorKind::Validation,
            PaymentError::Api(e) => e.kind(),
        }
    }
}
