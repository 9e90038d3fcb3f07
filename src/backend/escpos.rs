//! # ESC/POS Hardware Backends
//!
//! Adapts the [`PrintBackend`](super::PrintBackend) capability surface to
//! the `escpos` driver crate. All protocol bytes come from the driver;
//! nothing here writes ESC/POS sequences by hand.
//!
//! One constructor per transport: network socket, serial line, USB device.
//! Opening the driver is the startup reachability check: a bad host,
//! missing device node or permission error fails here. After that,
//! network printers also answer a real-time status request, which backs
//! the health route's online/offline report.

use std::time::Duration;

use escpos::driver::{Driver, NetworkDriver, SerialPortDriver, UsbDriver};
use escpos::printer::Printer;
use escpos::utils::*;

use crate::config::{Alignment, Font as ConfigFont, FormatDefaults};
use crate::error::ImpresoraError;

use super::{BarcodeJob, BarcodeKind, ImageJob, PrintBackend, TextPosition};

/// A connected printer driven through the `escpos` crate.
///
/// Keeps a clone of the driver next to the [`Printer`] so the status
/// probe can read the printer's one-byte reply.
pub struct EscposBackend<D: Driver> {
    printer: Printer<D>,
    driver: D,
    name: &'static str,
    /// Whether `is_online` sends a real-time status request. Only the
    /// network transport answers it reliably.
    probe_status: bool,
}

impl EscposBackend<NetworkDriver> {
    /// Connect to a network printer over a raw TCP socket.
    pub fn open_network(host: &str, port: u16) -> Result<Self, ImpresoraError> {
        let driver = NetworkDriver::open(host, port, None).map_err(|e| {
            ImpresoraError::Transport(format!("failed to reach {}:{}: {}", host, port, e))
        })?;
        Ok(Self {
            printer: Printer::new(driver.clone(), Protocol::default(), None),
            driver,
            name: "network",
            probe_status: true,
        })
    }
}

impl EscposBackend<SerialPortDriver> {
    /// Connect to a printer on a serial line.
    pub fn open_serial(path: &str, baud_rate: u32, timeout_secs: u64) -> Result<Self, ImpresoraError> {
        let driver =
            SerialPortDriver::open(path, baud_rate, Some(Duration::from_secs(timeout_secs)))
                .map_err(|e| {
                    ImpresoraError::Transport(format!("failed to open {}: {}", path, e))
                })?;
        Ok(Self {
            printer: Printer::new(driver.clone(), Protocol::default(), None),
            driver,
            name: "serial",
            probe_status: false,
        })
    }
}

impl EscposBackend<UsbDriver> {
    /// Connect to a USB printer by vendor and product id.
    pub fn open_usb(vendor_id: u16, product_id: u16) -> Result<Self, ImpresoraError> {
        let driver = UsbDriver::open(vendor_id, product_id, None, None).map_err(|e| {
            ImpresoraError::Transport(format!(
                "failed to open usb device {:04x}:{:04x}: {}",
                vendor_id, product_id, e
            ))
        })?;
        Ok(Self {
            printer: Printer::new(driver.clone(), Protocol::default(), None),
            driver,
            name: "usb",
            probe_status: false,
        })
    }
}

impl<D: Driver> EscposBackend<D> {
    /// Ask the printer for its real-time status and read the one-byte
    /// reply off the driver.
    fn query_online(&mut self) -> Result<bool, ImpresoraError> {
        self.printer
            .real_time_status(RealTimeStatusRequest::Printer)?
            .send_status()?;

        let mut buf = [0u8; 1];
        self.driver.read(&mut buf)?;

        let statuses = RealTimeStatusResponse::parse(RealTimeStatusRequest::Printer, buf[0])?;
        Ok(statuses
            .get(&RealTimeStatusResponse::Online)
            .copied()
            .unwrap_or(false))
    }
}

impl<D: Driver + Send> PrintBackend for EscposBackend<D> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_online(&mut self) -> bool {
        // Serial and USB printers commonly leave the status request
        // unanswered, so the live handle is the only signal there.
        if !self.probe_status {
            return true;
        }
        match self.query_online() {
            Ok(online) => online,
            Err(e) => {
                tracing::warn!("printer status probe failed: {}", e);
                false
            }
        }
    }

    fn apply_defaults(&mut self, format: &FormatDefaults) -> Result<(), ImpresoraError> {
        let width = if format.double_width { 2 } else { 1 };
        let height = if format.double_height { 2 } else { 1 };
        self.printer
            .init()?
            .justify(justify_mode(format.alignment))?
            .font(match format.font {
                ConfigFont::A => Font::A,
                ConfigFont::B => Font::B,
            })?
            .bold(format.bold)?
            .underline(underline_mode(format.underline))?
            .size(width, height)?
            .reverse(format.inverse)?
            .upside_down(format.flip)?
            .print()?;
        Ok(())
    }

    fn justify(&mut self, alignment: Alignment) -> Result<(), ImpresoraError> {
        self.printer.justify(justify_mode(alignment))?.print()?;
        Ok(())
    }

    fn print_text(&mut self, text: &str) -> Result<(), ImpresoraError> {
        self.printer.writeln(text)?.print()?;
        Ok(())
    }

    fn print_qr(&mut self, content: &str, size: u8) -> Result<(), ImpresoraError> {
        self.printer
            .qrcode_option(
                content,
                QRCodeOption::new(QRCodeModel::Model1, size, QRCodeCorrectionLevel::M),
            )?
            .print()?;
        Ok(())
    }

    fn print_barcode(&mut self, job: &BarcodeJob) -> Result<(), ImpresoraError> {
        let option = BarcodeOption::new(
            barcode_width(job.width),
            barcode_height(job.height),
            BarcodeFont::A,
            barcode_position(job.position),
        );
        match job.kind {
            BarcodeKind::UpcA => self.printer.upca_option(&job.code, option)?,
            BarcodeKind::UpcE => self.printer.upce_option(&job.code, option)?,
            BarcodeKind::Ean13 => self.printer.ean13_option(&job.code, option)?,
            BarcodeKind::Ean8 => self.printer.ean8_option(&job.code, option)?,
            BarcodeKind::Code39 => self.printer.code39_option(&job.code, option)?,
            BarcodeKind::Itf => self.printer.itf_option(&job.code, option)?,
            BarcodeKind::Nw7 => self.printer.codabar_option(&job.code, option)?,
        };
        self.printer.print()?;
        Ok(())
    }

    fn print_image(&mut self, job: &ImageJob) -> Result<(), ImpresoraError> {
        // The driver exposes one raster path; all three requested modes
        // render through it. Density flags select the doubled sizes.
        tracing::debug!(mode = ?job.mode, "rendering image through the raster path");
        let size = match (job.high_density_horizontal, job.high_density_vertical) {
            (true, true) => BitImageSize::Normal,
            (false, true) => BitImageSize::DoubleWidth,
            (true, false) => BitImageSize::DoubleHeight,
            (false, false) => BitImageSize::DoubleWidthAndHeight,
        };
        let option = BitImageOption::new(None, None, size)?;
        self.printer
            .bit_image_from_bytes_option(&job.bytes, option)?
            .print()?;
        Ok(())
    }

    fn feed(&mut self, lines: u8) -> Result<(), ImpresoraError> {
        self.printer.feeds(lines)?.print()?;
        Ok(())
    }

    fn cut(&mut self) -> Result<(), ImpresoraError> {
        self.printer.cut()?.print()?;
        Ok(())
    }
}

fn justify_mode(alignment: Alignment) -> JustifyMode {
    match alignment {
        Alignment::Left => JustifyMode::LEFT,
        Alignment::Center => JustifyMode::CENTER,
        Alignment::Right => JustifyMode::RIGHT,
    }
}

fn underline_mode(level: u8) -> UnderlineMode {
    match level {
        0 => UnderlineMode::None,
        1 => UnderlineMode::Single,
        _ => UnderlineMode::Double,
    }
}

fn barcode_position(position: TextPosition) -> BarcodePosition {
    match position {
        TextPosition::None => BarcodePosition::None,
        TextPosition::Above => BarcodePosition::Above,
        TextPosition::Below => BarcodePosition::Below,
        TextPosition::Both => BarcodePosition::Both,
    }
}

/// Map the requested module width (2-6 dots) onto the driver's width steps.
fn barcode_width(width: u8) -> BarcodeWidth {
    match width {
        0..=2 => BarcodeWidth::S,
        3 => BarcodeWidth::M,
        4 => BarcodeWidth::L,
        _ => BarcodeWidth::XL,
    }
}

/// Map the requested bar height (1-255 dots) onto the driver's height steps.
fn barcode_height(height: u8) -> BarcodeHeight {
    match height {
        0..=63 => BarcodeHeight::S,
        64..=127 => BarcodeHeight::M,
        128..=191 => BarcodeHeight::L,
        _ => BarcodeHeight::XL,
    }
}
