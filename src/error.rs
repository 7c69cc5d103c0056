//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Domain errors (business rules, validation, not-found, conflicts)
    #[error(transparent)]
    Domain(#[from] crate::domain::DomainError),

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            AppError::Domain(ref domain_err) => {
                use crate::domain::DomainError;
                match domain_err {
                    // 400 Bad Request
                    DomainError::SameAccountTransfer => {
                        (StatusCode::BAD_REQUEST, "same_account_transfer", None)
                    }
                    DomainError::InvalidAmount(msg) => {
                        (StatusCode::BAD_REQUEST, "invalid_amount", Some(msg.clone()))
                    }
                    DomainError::SourceFrozen => {
                        (StatusCode::BAD_REQUEST, "source_frozen", None)
                    }
                    DomainError::DestinationFrozen => {
                        (StatusCode::BAD_REQUEST, "destination_frozen", None)
                    }
                    DomainError::InsufficientFunds { .. } => (
                        StatusCode::BAD_REQUEST,
                        "insufficient_funds",
                        Some(domain_err.to_string()),
                    ),
                    DomainError::AccountInUse(id) => (
                        StatusCode::BAD_REQUEST,
                        "account_in_use",
                        Some(id.to_string()),
                    ),
                    DomainError::Validation(msg) => {
                        (StatusCode::BAD_REQUEST, "validation_error", Some(msg.clone()))
                    }

                    // 404 Not Found
                    DomainError::AccountNotFound(id) => (
                        StatusCode::NOT_FOUND,
                        "account_not_found",
                        Some(id.to_string()),
                    ),
                    DomainError::TransferNotFound(id) => (
                        StatusCode::NOT_FOUND,
                        "transfer_not_found",
                        Some(id.to_string()),
                    ),

                    // 409 Conflict
                    DomainError::NameTaken(name) => {
                        (StatusCode::CONFLICT, "name_taken", Some(name.clone()))
                    }
                    DomainError::IbanTaken(iban) => {
                        (StatusCode::CONFLICT, "iban_taken", Some(iban.clone()))
                    }
                    DomainError::StorageConflict => {
                        (StatusCode::CONFLICT, "storage_conflict", None)
                    }
                }
            }

            // 500 Internal Server Error
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
