pub mod error_kind;
pub mod model_error;
