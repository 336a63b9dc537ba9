//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{ledger::DeclineReason, validation::FieldViolation};

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error from database operations
/// - **Resource Errors**: Requested customer, account or recipient not found
/// - **Admission Errors**: The ledger declined a deposit, withdrawal or transfer
/// - **Validation Errors**: Invalid request data, with per-field details
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be turned back into a domain value.
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error("Customer not found")]
    CustomerNotFound,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Recipient not found")]
    RecipientNotFound,

    /// The ledger refused the operation. No balance was changed.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("{0}")]
    Declined(#[from] DeclineReason),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// The caller referred to something that does not exist in a context
    /// where that is a programming error, e.g. deleting an unknown id.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A customer was saved from a copy that is no longer current.
    ///
    /// Returns HTTP 409 Conflict. Reload the customer and retry.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// One or more input fields failed validation.
    #[error("Validation failed")]
    Validation(Vec<FieldViolation>),
}

impl AppError {
    /// Turn a validator's output into a result.
    pub fn check(violations: Vec<FieldViolation>) -> Result<(), AppError> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(violations))
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Validation errors additionally carry a `violations` array of
/// `{ "field", "message" }` objects.
///
/// # Status Code Mapping
///
/// - `*NotFound` → 404 Not Found
/// - `Declined` → 422 Unprocessable Entity
/// - `Conflict` → 409 Conflict
/// - `InvalidRequest`, `InvalidArgument`, `Validation` → 400 Bad Request
/// - `Database`, `CorruptRecord` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::CustomerNotFound => (
                StatusCode::NOT_FOUND,
                "customer_not_found",
                self.to_string(),
            ),
            AppError::AccountNotFound => {
                (StatusCode::NOT_FOUND, "account_not_found", self.to_string())
            }
            AppError::RecipientNotFound => (
                StatusCode::NOT_FOUND,
                "recipient_not_found",
                self.to_string(),
            ),
            AppError::Declined(reason) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                reason.code(),
                reason.to_string(),
            ),
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::InvalidArgument(_) => (
                StatusCode::BAD_REQUEST,
                "invalid_argument",
                self.to_string(),
            ),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict", self.to_string()),
            AppError::Validation(violations) => {
                let body = Json(json!({
                    "error": {
                        "code": "validation_failed",
                        "message": "Validation failed",
                        "violations": violations,
                    }
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::CorruptRecord(detail) => {
                tracing::error!(detail = %detail, "corrupt record");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
