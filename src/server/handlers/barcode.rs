//! Barcode printing handler (`POST /barcode/`).

use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::backend::{BarcodeJob, BarcodeKind, TextPosition};
use crate::config::Alignment;
use crate::error::ImpresoraError;

use super::super::state::AppState;
use super::{ApiError, ack, default_copies, default_true, validate_copies};

/// Query parameters for `/barcode/`.
#[derive(Debug, Deserialize)]
pub struct BarcodeForm {
    /// Barcode content.
    pub code: String,
    /// Symbology: UPC-A, UPC-E, EAN13, EAN8, CODE39, ITF or NW7.
    #[serde(rename = "type")]
    pub kind: String,
    /// Bar height in dots, 1-255.
    #[serde(default = "default_height")]
    pub height: i64,
    /// Module width, 2-6.
    #[serde(default = "default_width")]
    pub width: i64,
    /// Placement of the human-readable text.
    #[serde(default = "default_position")]
    pub position: String,
    /// Center the barcode for this job.
    #[serde(default)]
    pub center: bool,
    #[serde(default = "default_copies")]
    pub copies: i64,
    /// Cut after each copy.
    #[serde(default = "default_true")]
    pub cut: bool,
}

fn default_height() -> i64 {
    64
}

fn default_width() -> i64 {
    3
}

fn default_position() -> String {
    "below".to_string()
}

/// Handle `POST /barcode/` - render a barcode `copies` times.
pub async fn print(
    State(state): State<Arc<AppState>>,
    Query(form): Query<BarcodeForm>,
) -> Result<Response, ApiError> {
    if form.code.trim().is_empty() {
        return Err(ApiError::bad_request("code must not be empty"));
    }
    let kind: BarcodeKind = form
        .kind
        .parse()
        .map_err(|e: ImpresoraError| ApiError::bad_request(e.to_string()))?;
    if !(1..=255).contains(&form.height) {
        return Err(ApiError::bad_request("height must be between 1 and 255"));
    }
    if !(2..=6).contains(&form.width) {
        return Err(ApiError::bad_request("width must be between 2 and 6"));
    }
    let position: TextPosition = form
        .position
        .parse()
        .map_err(|e: ImpresoraError| ApiError::bad_request(e.to_string()))?;
    let copies = validate_copies(form.copies)?;

    let job = BarcodeJob {
        code: form.code,
        kind,
        height: form.height as u8,
        width: form.width as u8,
        position,
    };

    tracing::info!(%kind, copies, "printing barcode");

    let default_alignment = state.config.format.alignment;
    let job_state = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut printer = job_state.printer()?;
        if form.center {
            printer.justify(Alignment::Center)?;
        }
        for _ in 0..copies {
            printer.print_barcode(&job)?;
            if form.cut {
                printer.cut()?;
            }
        }
        if form.center {
            printer.justify(default_alignment)?;
        }
        Ok::<(), ImpresoraError>(())
    })
    .await;

    match result {
        Ok(Ok(())) => Ok(ack("Barcode printed.")),
        Ok(Err(e)) => Err(ApiError::print_failure("barcode", e)),
        Err(e) => Err(ApiError::internal(format!("barcode task error: {}", e))),
    }
}
