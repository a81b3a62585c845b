use crate::ErrorLocation;

use thiserror::Error as ThisError;

/// Raised when a [`RedactedSecret`](crate::RedactedSecret) is serialized
/// without going through the `exposed` adapter.
#[derive(Debug, ThisError)]
pub enum RedactError {
    #[error("Secret Serialization Error: {message} {location}")]
    Serialization {
        message: String,
        location: ErrorLocation,
    },
}
