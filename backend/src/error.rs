//! Error handling for the field health backend
//!
//! Provides consistent JSON error responses for the monitoring API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::FieldError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Input errors
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Offline errors
    #[error("No cached data available for field {field_id} and device is offline")]
    NoCachedDataOffline { field_id: String },

    // Statistics provider errors
    #[error("Statistics provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Statistics provider timed out after {0} ms")]
    ProviderTimeout(u64),

    #[error("Malformed statistics response: {0}")]
    MalformedProviderResponse(String),

    // Notification errors
    #[error("{channel} delivery failed: {message}")]
    ChannelDelivery { channel: String, message: String },

    // Persistence errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether a statistics failure should route to the fallback estimate
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            AppError::ProviderUnavailable(_)
                | AppError::ProviderTimeout(_)
                | AppError::MalformedProviderResponse(_)
        )
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Field(FieldError::InvalidGeometry(msg)) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_GEOMETRY".to_string(),
                    message: msg.clone(),
                    field: Some("geometry".to_string()),
                },
            ),
            AppError::Field(FieldError::InvalidStatistics(msg)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_STATISTICS".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::Field(FieldError::InvalidInput { field, message }) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                },
            ),
            AppError::NoCachedDataOffline { field_id } => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "OFFLINE_NO_CACHE".to_string(),
                    message: format!(
                        "No cached data available for field {} and device is offline",
                        field_id
                    ),
                    field: None,
                },
            ),
            AppError::ProviderUnavailable(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "PROVIDER_UNAVAILABLE".to_string(),
                    message: format!("Statistics provider unavailable: {}", msg),
                    field: None,
                },
            ),
            AppError::ProviderTimeout(ms) => (
                StatusCode::GATEWAY_TIMEOUT,
                ErrorDetail {
                    code: "PROVIDER_TIMEOUT".to_string(),
                    message: format!("Statistics provider timed out after {} ms", ms),
                    field: None,
                },
            ),
            AppError::MalformedProviderResponse(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "MALFORMED_PROVIDER_RESPONSE".to_string(),
                    message: format!("Malformed statistics response: {}", msg),
                    field: None,
                },
            ),
            AppError::ChannelDelivery { channel, message } => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "CHANNEL_DELIVERY_FAILED".to_string(),
                    message: format!("{} delivery failed: {}", channel, message),
                    field: None,
                },
            ),
            AppError::Persistence(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "PERSISTENCE_ERROR".to_string(),
                    message: format!("Persistence error: {}", msg),
                    field: None,
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message: format!("Configuration error: {}", msg),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for services and handlers
pub type AppResult<T> = Result<T, AppError>;
