//! Text and QR printing handler (`POST /print/`).

use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::config::Alignment;
use crate::error::ImpresoraError;

use super::super::state::AppState;
use super::{ApiError, ack, default_copies, default_true, validate_copies};

/// Query parameters for `/print/`.
#[derive(Debug, Deserialize)]
pub struct PrintForm {
    /// Content to print, as a text line or QR payload.
    pub content: String,
    #[serde(default = "default_copies")]
    pub copies: i64,
    /// Cut after each copy.
    #[serde(default = "default_true")]
    pub cut: bool,
    /// Alignment override; defaults to the configured alignment.
    pub alignment: Option<String>,
    /// Render the content as a QR code instead of text.
    #[serde(default)]
    pub qr: bool,
    /// QR module size, 1-16.
    #[serde(default = "default_qr_size")]
    pub size: i64,
}

fn default_qr_size() -> i64 {
    8
}

/// Handle `POST /print/` - print text or a QR code `copies` times.
pub async fn print(
    State(state): State<Arc<AppState>>,
    Query(form): Query<PrintForm>,
) -> Result<Response, ApiError> {
    if form.content.trim().is_empty() {
        return Err(ApiError::bad_request("content must not be empty"));
    }
    let copies = validate_copies(form.copies)?;
    let alignment: Alignment = match &form.alignment {
        Some(raw) => raw.parse().map_err(|e: ImpresoraError| ApiError::bad_request(e.to_string()))?,
        None => state.config.format.alignment,
    };
    if form.qr && !(1..=16).contains(&form.size) {
        return Err(ApiError::bad_request("size must be between 1 and 16"));
    }
    let size = form.size.clamp(1, 16) as u8;

    tracing::info!(copies, qr = form.qr, %alignment, "printing content");

    // One critical section per request: alignment through final cut.
    let default_alignment = state.config.format.alignment;
    let job_state = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut printer = job_state.printer()?;
        printer.justify(alignment)?;
        for _ in 0..copies {
            if form.qr {
                printer.print_qr(&form.content, size)?;
            } else {
                printer.print_text(&form.content)?;
            }
            if form.cut {
                printer.cut()?;
            }
        }
        printer.justify(default_alignment)?;
        Ok::<(), ImpresoraError>(())
    })
    .await;

    match result {
        Ok(Ok(())) => Ok(ack("Content printed.")),
        Ok(Err(e)) => Err(ApiError::print_failure("print", e)),
        Err(e) => Err(ApiError::internal(format!("print task error: {}", e))),
    }
}
