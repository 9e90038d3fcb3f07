//! HTTP handlers for the server.
//!
//! Every handler validates its own parameters before touching the printer;
//! validation failures reply with 400 and never reach the transport.
//! Successful prints acknowledge with a JSON `message`.

pub mod barcode;
pub mod cut;
pub mod image;
pub mod status;
pub mod text;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::ImpresoraError;

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_copies() -> i64 {
    1
}

/// Error reply: HTTP status plus a human-readable `message`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Request validation failure. The transport was never touched.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// A printer operation failed mid-job. Names the failed operation;
    /// the copy loop has already been aborted.
    pub fn print_failure(operation: &str, err: ImpresoraError) -> Self {
        tracing::error!("{} failed: {}", operation, err);
        let status = match err {
            // Unsupported values are the caller's to fix.
            ImpresoraError::Unsupported(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: format!("{} failed: {}", operation, err),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

/// Success acknowledgement.
pub(crate) fn ack(message: &str) -> Response {
    (StatusCode::OK, Json(json!({ "message": message }))).into_response()
}

/// Copy counts come in signed so that `copies=0` and negatives produce a
/// clean 400 instead of a deserialization rejection.
pub(crate) fn validate_copies(copies: i64) -> Result<u32, ApiError> {
    if copies < 1 {
        return Err(ApiError::bad_request("copies must be at least 1"));
    }
    u32::try_from(copies).map_err(|_| ApiError::bad_request("copies is too large"))
}
