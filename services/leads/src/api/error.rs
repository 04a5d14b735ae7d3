//! API error types and helpers.
//!
//! Centralizes HTTP error response construction so every endpoint returns
//! the same `{success, code, message}` shape. Internal errors log details
//! server-side and hand the client a generic message.
use crate::api::types::ErrorResponse;
use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// Structured API error returned by handlers.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn build(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            success: false,
            code: code.to_string(),
            message: message.to_string(),
        },
    }
}

/// 400 with code `validation_error`. The message text is part of the
/// contract for the legacy form and admin clients.
pub fn api_validation_error(message: &str) -> ApiError {
    build(StatusCode::BAD_REQUEST, "validation_error", message)
}

pub fn api_not_found(message: &str) -> ApiError {
    build(StatusCode::NOT_FOUND, "not_found", message)
}

/// 500 from a store error. Logs the details, returns a generic message.
pub fn api_internal(message: &str, err: &StoreError) -> ApiError {
    tracing::error!(error = ?err, "leads storage error");
    build(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

pub fn api_internal_message(message: &str) -> ApiError {
    build(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}
