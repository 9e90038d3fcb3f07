//! # HTTP Server
//!
//! Exposes the print façade over HTTP. Six routes, all replying JSON with
//! a human-readable `message`:
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /` | health + printer reachability |
//! | `GET /config/` | echo of the active printer configuration |
//! | `POST /print/` | text or QR code |
//! | `POST /barcode/` | barcode |
//! | `POST /image/` | raster image (multipart upload) |
//! | `POST /cut/` | paper cut |
//!
//! ## Usage
//!
//! ```bash
//! PRINTER_TYPE=dummy impresora serve --listen 0.0.0.0:8000
//! ```

mod handlers;
pub mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::ImpresoraError;

/// Maximum size for image uploads.
const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Build the application router around shared state.
///
/// Public so tests can drive the routes against a dummy backend without
/// binding a socket.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::status::health))
        .route("/config/", get(handlers::status::config))
        .route("/print/", post(handlers::text::print))
        .route("/barcode/", post(handlers::barcode::print))
        .route(
            "/image/",
            post(handlers::image::print).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route("/cut/", post(handlers::cut::cut))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server and block until it exits.
pub async fn serve(config: ServerConfig, state: Arc<AppState>) -> Result<(), ImpresoraError> {
    tracing::info!(
        listen = %config.listen_addr,
        transport = state.config.transport.kind(),
        "impresora HTTP server starting"
    );

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            ImpresoraError::Transport(format!("failed to bind to {}: {}", config.listen_addr, e))
        })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ImpresoraError::Transport(format!("server error: {}", e)))?;

    Ok(())
}
