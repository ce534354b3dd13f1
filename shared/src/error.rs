//! Domain errors raised by the pure field computations

use thiserror::Error;

/// Errors from validating or computing over field inputs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid statistics: {0}")]
    InvalidStatistics(String),

    #[error("Invalid input for {field}: {message}")]
    InvalidInput { field: String, message: String },
}

pub type FieldResult<T> = Result<T, FieldError>;
