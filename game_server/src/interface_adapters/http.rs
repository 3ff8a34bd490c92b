// Shared HTTP response types for consistent API error payloads.

use crate::domain::errors::AccountError;
use axum::{Json, http::StatusCode};
use tracing::error;

#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    // Human-readable error string.
    pub message: String,
    // Stable machine-readable code clients branch on.
    pub code: &'static str,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, code: &'static str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            message: message.into(),
            code,
        }),
    )
}

pub fn map_account_error(err: AccountError) -> ApiError {
    let (status, code) = match &err {
        AccountError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
        AccountError::NonSequential { .. } => (StatusCode::CONFLICT, "non_sequential"),
        AccountError::InsufficientFunds { .. } => (StatusCode::PAYMENT_REQUIRED, "insufficient_funds"),
        AccountError::InvalidTier(_) => (StatusCode::BAD_REQUEST, "invalid_tier"),
        AccountError::NothingToTrade => (StatusCode::BAD_REQUEST, "nothing_to_trade"),
        AccountError::Storage(_) => {
            error!(error = %err, "account storage failure");
            // Keep storage details out of client responses.
            return error_response(StatusCode::BAD_GATEWAY, "storage_error", "account storage failed");
        }
        AccountError::AuthUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "auth_unavailable"),
    };
    error_response(status, code, err.to_string())
}
