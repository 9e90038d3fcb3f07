//! Paper cut handler (`POST /cut/`).

use axum::{extract::State, response::Response};
use std::sync::Arc;

use crate::error::ImpresoraError;

use super::super::state::AppState;
use super::{ApiError, ack};

/// Handle `POST /cut/` - cut the paper once.
pub async fn cut(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    tracing::info!("cutting paper");

    let job_state = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut printer = job_state.printer()?;
        printer.cut()?;
        Ok::<(), ImpresoraError>(())
    })
    .await;

    match result {
        Ok(Ok(())) => Ok(ack("Paper cut.")),
        Ok(Err(e)) => Err(ApiError::print_failure("cut", e)),
        Err(e) => Err(ApiError::internal(format!("cut task error: {}", e))),
    }
}
