//! # Impresora - ESC/POS Printer HTTP Facade
//!
//! Impresora forwards print requests (text, QR codes, barcodes, images,
//! paper cuts) to an ESC/POS receipt printer over HTTP. The printer is
//! configured once at startup from environment variables; the ESC/POS
//! byte protocol and the transports come from the `escpos` driver crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use impresora::{
//!     backend,
//!     config::PrinterConfig,
//!     server::{self, AppState, ServerConfig},
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), impresora::ImpresoraError> {
//! let config = PrinterConfig::from_env()?;
//! let printer = backend::connect(&config)?;
//! let state = Arc::new(AppState::new(config, printer));
//!
//! server::serve(
//!     ServerConfig { listen_addr: "0.0.0.0:8000".to_string() },
//!     state,
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | environment-variable configuration loader |
//! | [`backend`] | printer capability trait and transport backends |
//! | [`server`] | axum routes and shared state |
//! | [`error`] | error types |

pub mod backend;
pub mod config;
pub mod error;
pub mod server;

// Re-exports for convenience
pub use config::PrinterConfig;
pub use error::ImpresoraError;
