//! Image printing handler (`POST /image/`).
//!
//! The image arrives as a multipart upload; settings come as query
//! parameters like the other routes. Uploads are format-checked and
//! decoded before the printer lock is taken, so a bad file never costs
//! a critical section.

use axum::{
    extract::{Multipart, Query, State},
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::backend::{ImageJob, ImageMode};
use crate::config::Alignment;
use crate::error::ImpresoraError;

use super::super::state::AppState;
use super::{ApiError, ack, default_copies, default_true, validate_copies};

/// Content types accepted for uploads.
const SUPPORTED_CONTENT_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/bmp",
    "image/gif",
];

/// Query parameters for `/image/`.
#[derive(Debug, Deserialize)]
pub struct ImageForm {
    #[serde(default = "default_true")]
    pub high_density_vertical: bool,
    #[serde(default = "default_true")]
    pub high_density_horizontal: bool,
    /// Rendering implementation: bitImageColumn, bitImageRaster or graphics.
    #[serde(rename = "impl", default = "default_impl")]
    pub impl_mode: String,
    /// Center the image for this job.
    #[serde(default)]
    pub center: bool,
    #[serde(default = "default_copies")]
    pub copies: i64,
    /// Cut after each copy.
    #[serde(default = "default_true")]
    pub cut: bool,
}

fn default_impl() -> String {
    "bitImageRaster".to_string()
}

/// Handle `POST /image/` - render an uploaded image `copies` times.
pub async fn print(
    State(state): State<Arc<AppState>>,
    Query(form): Query<ImageForm>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let mode: ImageMode = form
        .impl_mode
        .parse()
        .map_err(|e: ImpresoraError| ApiError::bad_request(e.to_string()))?;
    let copies = validate_copies(form.copies)?;
    let bytes = read_upload(multipart).await?;

    // Reject undecodable files up front; the driver never sees them.
    image::load_from_memory(&bytes)
        .map_err(|e| ApiError::bad_request(format!("file is not a decodable image: {}", e)))?;

    let job = ImageJob {
        bytes,
        mode,
        high_density_vertical: form.high_density_vertical,
        high_density_horizontal: form.high_density_horizontal,
    };

    tracing::info!(?mode, copies, bytes = job.bytes.len(), "printing image");

    let default_alignment = state.config.format.alignment;
    let job_state = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut printer = job_state.printer()?;
        if form.center {
            printer.justify(Alignment::Center)?;
        }
        for _ in 0..copies {
            printer.print_image(&job)?;
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
        Ok(Ok(())) => Ok(ack("Image printed.")),
        Ok(Err(e)) => Err(ApiError::print_failure("image", e)),
        Err(e) => Err(ApiError::internal(format!("image task error: {}", e))),
    }
}

/// Pull the uploaded file out of the multipart body.
///
/// Accepts the first field named `file` (or carrying a filename) and
/// checks its declared content type against the supported set.
async fn read_upload(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {}", e)))?
    {
        let is_file = field.name() == Some("file") || field.file_name().is_some();
        if !is_file {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !SUPPORTED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(ApiError::bad_request(format!(
                "unsupported image format '{}' (supported: PNG, JPG, BMP, GIF)",
                content_type
            )));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("failed to read upload: {}", e)))?;
        if bytes.is_empty() {
            return Err(ApiError::bad_request("uploaded file is empty"));
        }
        return Ok(bytes.to_vec());
    }

    Err(ApiError::bad_request("no image file provided"))
}
