//! # Printer Backend Layer
//!
//! This module provides the capability surface the HTTP layer prints
//! through, and the dispatch that selects one backend per process.
//!
//! ## Available Backends
//!
//! - [`escpos`]: hardware backends over the ESC/POS driver crate
//!   (network socket, serial line, USB device)
//! - [`dummy`]: in-memory recording sink, no hardware required
//!
//! The backend is chosen exactly once at startup from the
//! [`PrinterConfig`]; endpoints never branch on the transport kind.

pub mod dummy;
pub mod escpos;

pub use dummy::DummyBackend;

use std::fmt;
use std::str::FromStr;

use crate::config::{Alignment, FormatDefaults, PrinterConfig, TransportConfig};
use crate::error::ImpresoraError;

/// Barcode symbologies the printer stack supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarcodeKind {
    UpcA,
    UpcE,
    Ean13,
    Ean8,
    Code39,
    Itf,
    /// NW-7, also known as Codabar.
    Nw7,
}

impl FromStr for BarcodeKind {
    type Err = ImpresoraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UPC-A" => Ok(Self::UpcA),
            "UPC-E" => Ok(Self::UpcE),
            "EAN13" => Ok(Self::Ean13),
            "EAN8" => Ok(Self::Ean8),
            "CODE39" => Ok(Self::Code39),
            "ITF" => Ok(Self::Itf),
            "NW7" | "CODABAR" => Ok(Self::Nw7),
            other => Err(ImpresoraError::Unsupported(format!(
                "barcode type '{}' (expected UPC-A, UPC-E, EAN13, EAN8, CODE39, ITF or NW7)",
                other
            ))),
        }
    }
}

impl fmt::Display for BarcodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UpcA => "UPC-A",
            Self::UpcE => "UPC-E",
            Self::Ean13 => "EAN13",
            Self::Ean8 => "EAN8",
            Self::Code39 => "CODE39",
            Self::Itf => "ITF",
            Self::Nw7 => "NW7",
        };
        write!(f, "{}", name)
    }
}

/// Placement of the human-readable text printed with a barcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPosition {
    None,
    Above,
    Below,
    Both,
}

impl FromStr for TextPosition {
    type Err = ImpresoraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "above" => Ok(Self::Above),
            "below" => Ok(Self::Below),
            "both" => Ok(Self::Both),
            other => Err(ImpresoraError::Unsupported(format!(
                "position '{}' (expected none, above, below or both)",
                other
            ))),
        }
    }
}

/// Raster rendering mode requested for image jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMode {
    BitImageColumn,
    BitImageRaster,
    Graphics,
}

impl FromStr for ImageMode {
    type Err = ImpresoraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bitimagecolumn" => Ok(Self::BitImageColumn),
            "bitimageraster" => Ok(Self::BitImageRaster),
            "graphics" => Ok(Self::Graphics),
            other => Err(ImpresoraError::Unsupported(format!(
                "image implementation '{}' (expected bitImageColumn, bitImageRaster or graphics)",
                other
            ))),
        }
    }
}

/// One validated barcode job.
#[derive(Debug, Clone)]
pub struct BarcodeJob {
    pub code: String,
    pub kind: BarcodeKind,
    /// Bar height in dots, 1-255.
    pub height: u8,
    /// Module width, 2-6.
    pub width: u8,
    pub position: TextPosition,
}

/// One validated image job. Bytes are the encoded upload (PNG, JPEG, BMP
/// or GIF), decoded by the driver.
#[derive(Debug, Clone)]
pub struct ImageJob {
    pub bytes: Vec<u8>,
    pub mode: ImageMode,
    pub high_density_vertical: bool,
    pub high_density_horizontal: bool,
}

/// Capability surface of a connected printer.
///
/// ESC/POS is a stateful byte stream, so callers must hold the process-wide
/// lock (see [`crate::server::state::AppState`]) across every sequence of
/// calls that belongs to one job.
pub trait PrintBackend: Send {
    /// Backend name for logs and the health route.
    fn name(&self) -> &'static str;

    /// Whether the printer looks reachable. Never fails; offline is a
    /// degraded health report, not an error.
    fn is_online(&mut self) -> bool;

    /// Initialize the printer and apply the configured formatting defaults.
    fn apply_defaults(&mut self, format: &FormatDefaults) -> Result<(), ImpresoraError>;

    /// Set the alignment for subsequent output.
    fn justify(&mut self, alignment: Alignment) -> Result<(), ImpresoraError>;

    /// Print one line of text.
    fn print_text(&mut self, text: &str) -> Result<(), ImpresoraError>;

    /// Render a QR code. `size` is the module size, 1-16.
    fn print_qr(&mut self, content: &str, size: u8) -> Result<(), ImpresoraError>;

    /// Render a barcode.
    fn print_barcode(&mut self, job: &BarcodeJob) -> Result<(), ImpresoraError>;

    /// Render a raster image.
    fn print_image(&mut self, job: &ImageJob) -> Result<(), ImpresoraError>;

    /// Feed `lines` blank lines.
    fn feed(&mut self, lines: u8) -> Result<(), ImpresoraError>;

    /// Cut the paper.
    fn cut(&mut self) -> Result<(), ImpresoraError>;
}

/// Construct the backend selected by the configuration and apply the
/// formatting defaults to it.
///
/// Initialization failures (unreachable host, missing device, permission
/// errors) surface here, at startup. There are no retries; the operator
/// fixes the configuration and restarts.
pub fn connect(config: &PrinterConfig) -> Result<Box<dyn PrintBackend>, ImpresoraError> {
    let mut backend: Box<dyn PrintBackend> = match &config.transport {
        TransportConfig::Network { host, port } => {
            Box::new(escpos::EscposBackend::open_network(host, *port)?)
        }
        TransportConfig::Serial {
            port,
            baud_rate,
            timeout_secs,
            ..
        } => Box::new(escpos::EscposBackend::open_serial(
            port,
            *baud_rate,
            *timeout_secs,
        )?),
        TransportConfig::Usb {
            vendor_id,
            product_id,
            ..
        } => Box::new(escpos::EscposBackend::open_usb(*vendor_id, *product_id)?),
        TransportConfig::Dummy => Box::new(DummyBackend::new()),
    };

    backend.apply_defaults(&config.format)?;
    Ok(backend)
}
