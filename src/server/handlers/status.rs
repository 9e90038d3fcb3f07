//! Health and configuration handlers (`GET /`, `GET /config/`).

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;

use super::super::state::AppState;

/// Handle `GET /` - service health plus printer reachability.
///
/// An unreachable printer degrades the report to `"offline"`; it is not
/// an error.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let probe_state = state.clone();
    let online = tokio::task::spawn_blocking(move || match probe_state.printer() {
        Ok(mut printer) => printer.is_online(),
        Err(_) => false,
    })
    .await
    .unwrap_or(false);

    tracing::info!(online, "health probe");

    Json(json!({
        "message": "Printer API is running",
        "printer_status": if online { "online" } else { "offline" },
    }))
    .into_response()
}

/// Handle `GET /config/` - echo the active printer configuration.
///
/// The serde shape of [`PrinterConfig`](crate::config::PrinterConfig)
/// guarantees only the active transport's fields appear.
pub async fn config(State(state): State<Arc<AppState>>) -> Json<crate::config::PrinterConfig> {
    Json(state.config.clone())
}
