//! # Error Types
//!
//! This module defines error types used throughout the impresora crate.

use thiserror::Error;

/// Main error type for impresora operations
#[derive(Debug, Error)]
pub enum ImpresoraError {
    /// Configuration errors (missing or malformed environment variables).
    /// Always fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level errors (connection, I/O)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Errors bubbled up from the ESC/POS driver
    #[error("Printer driver error: {0}")]
    Driver(#[from] escpos::errors::PrinterError),

    /// A requested value the printer stack does not support
    /// (barcode symbology, image mode, alignment)
    #[error("Unsupported value: {0}")]
    Unsupported(String),

    /// Image processing error
    #[error("Image error: {0}")]
    Image(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
