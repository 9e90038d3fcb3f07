//! # Printer Configuration
//!
//! Loads the process-wide printer configuration from environment variables,
//! once at startup. The result is immutable for the process lifetime and is
//! echoed back by the `GET /config/` route.
//!
//! ## Environment Variables
//!
//! | Variable | Transport | Default | Notes |
//! |----------|-----------|---------|-------|
//! | `PRINTER_TYPE` | all | — | required: `network`, `serial`, `usb`, `dummy` |
//! | `PRINTER_IP` | network | — | required |
//! | `PRINTER_PORT` | network | 9100 | raw-print TCP port |
//! | `PRINTER_SERIAL_PORT` | serial | — | required, device path |
//! | `PRINTER_SERIAL_BAUDRATE` | serial | 9600 | must be a standard rate |
//! | `PRINTER_SERIAL_BYTESIZE` | serial | 8 | 5-8 |
//! | `PRINTER_SERIAL_PARITY` | serial | N | N, E, or O |
//! | `PRINTER_SERIAL_STOPBITS` | serial | 1 | 1 or 2 |
//! | `PRINTER_SERIAL_TIMEOUT` | serial | 1 | seconds |
//! | `PRINTER_SERIAL_DSRDTR` | serial | false | hardware flow control |
//! | `PRINTER_SERIAL_RTSCTS` | serial | false | hardware flow control |
//! | `PRINTER_USB_VENDOR_ID` | usb | — | required, decimal or `0x`-hex |
//! | `PRINTER_USB_PRODUCT_ID` | usb | — | required, decimal or `0x`-hex |
//! | `PRINTER_USB_INTERFACE` | usb | — | optional |
//! | `PRINTER_USB_ENDPOINT_OUT` | usb | — | optional |
//!
//! Formatting defaults (`PRINTER_ALIGNMENT`, `PRINTER_FONT`, `PRINTER_BOLD`,
//! `PRINTER_UNDERLINE`, `PRINTER_DOUBLE_HEIGHT`, `PRINTER_DOUBLE_WIDTH`,
//! `PRINTER_INVERSE`, `PRINTER_FLIP`) apply to every job until overridden
//! per request.
//!
//! A missing or malformed variable for the selected transport is a fatal
//! startup error, never a per-request error.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ImpresoraError;

/// Default TCP port for raw ESC/POS network printing.
pub const DEFAULT_NETWORK_PORT: u16 = 9100;

/// Baud rates accepted for the serial transport.
const STANDARD_BAUD_RATES: &[u32] = &[1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200];

/// Text alignment for printed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl FromStr for Alignment {
    type Err = ImpresoraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            other => Err(ImpresoraError::Unsupported(format!(
                "alignment '{}' (expected left, center or right)",
                other
            ))),
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Center => write!(f, "center"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Printer character font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Font {
    A,
    B,
}

impl FromStr for Font {
    type Err = ImpresoraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a" => Ok(Self::A),
            "b" => Ok(Self::B),
            other => Err(ImpresoraError::Unsupported(format!(
                "font '{}' (expected a or b)",
                other
            ))),
        }
    }
}

/// Serial line parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Parity {
    #[serde(rename = "N")]
    None,
    #[serde(rename = "E")]
    Even,
    #[serde(rename = "O")]
    Odd,
}

impl FromStr for Parity {
    type Err = ImpresoraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "N" => Ok(Self::None),
            "E" => Ok(Self::Even),
            "O" => Ok(Self::Odd),
            other => Err(ImpresoraError::Unsupported(format!(
                "parity '{}' (expected N, E or O)",
                other
            ))),
        }
    }
}

/// The transport used to deliver ESC/POS bytes to the printer.
///
/// Selected once at startup from `PRINTER_TYPE`; one variant per backend.
/// The serde tag makes `/config/` echo only the fields relevant to the
/// active transport.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// TCP socket to a network printer.
    Network { host: String, port: u16 },
    /// Serial line (RS-232 or USB-serial adapter).
    Serial {
        port: String,
        baud_rate: u32,
        byte_size: u8,
        parity: Parity,
        stop_bits: u8,
        timeout_secs: u64,
        dsr_dtr: bool,
        rts_cts: bool,
    },
    /// Direct USB device.
    Usb {
        vendor_id: u16,
        product_id: u16,
        #[serde(skip_serializing_if = "Option::is_none")]
        interface: Option<u8>,
        #[serde(skip_serializing_if = "Option::is_none")]
        endpoint_out: Option<u8>,
    },
    /// In-memory sink that accepts every write. No hardware required.
    Dummy,
}

impl TransportConfig {
    /// Short name of the transport kind, for logs and the health route.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Serial { .. } => "serial",
            Self::Usb { .. } => "usb",
            Self::Dummy => "dummy",
        }
    }
}

/// Formatting state applied to the printer at startup and restored after
/// each job that overrides it.
#[derive(Debug, Clone, Serialize)]
pub struct FormatDefaults {
    pub alignment: Alignment,
    pub font: Font,
    pub bold: bool,
    /// Underline level: 0 = off, 1 = single, 2 = double.
    pub underline: u8,
    pub double_height: bool,
    pub double_width: bool,
    pub inverse: bool,
    pub flip: bool,
}

impl Default for FormatDefaults {
    fn default() -> Self {
        Self {
            alignment: Alignment::Left,
            font: Font::A,
            bold: false,
            underline: 0,
            double_height: false,
            double_width: false,
            inverse: false,
            flip: false,
        }
    }
}

/// Process-wide printer configuration. Built once at startup, read-only
/// afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct PrinterConfig {
    pub transport: TransportConfig,
    pub format: FormatDefaults,
}

impl PrinterConfig {
    /// Load the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ImpresoraError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Build the configuration from an explicit variable map.
    ///
    /// `from_env` delegates here; tests pass maps directly instead of
    /// mutating process-global state.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ImpresoraError> {
        let transport = match require(vars, "PRINTER_TYPE")? {
            "network" => TransportConfig::Network {
                host: require(vars, "PRINTER_IP")?.to_string(),
                port: parse_or(vars, "PRINTER_PORT", DEFAULT_NETWORK_PORT)?,
            },
            "serial" => load_serial(vars)?,
            "usb" => load_usb(vars)?,
            "dummy" => TransportConfig::Dummy,
            other => {
                return Err(ImpresoraError::Config(format!(
                    "PRINTER_TYPE '{}' is not supported (expected network, serial, usb or dummy)",
                    other
                )));
            }
        };

        Ok(Self {
            transport,
            format: load_format(vars)?,
        })
    }
}

fn load_serial(vars: &HashMap<String, String>) -> Result<TransportConfig, ImpresoraError> {
    let baud_rate: u32 = parse_or(vars, "PRINTER_SERIAL_BAUDRATE", 9600)?;
    if !STANDARD_BAUD_RATES.contains(&baud_rate) {
        return Err(ImpresoraError::Config(format!(
            "PRINTER_SERIAL_BAUDRATE {} is not a standard rate ({:?})",
            baud_rate, STANDARD_BAUD_RATES
        )));
    }

    let byte_size: u8 = parse_or(vars, "PRINTER_SERIAL_BYTESIZE", 8)?;
    if !(5..=8).contains(&byte_size) {
        return Err(ImpresoraError::Config(format!(
            "PRINTER_SERIAL_BYTESIZE {} is out of range (5-8)",
            byte_size
        )));
    }

    let stop_bits: u8 = parse_or(vars, "PRINTER_SERIAL_STOPBITS", 1)?;
    if stop_bits != 1 && stop_bits != 2 {
        return Err(ImpresoraError::Config(format!(
            "PRINTER_SERIAL_STOPBITS {} is out of range (1 or 2)",
            stop_bits
        )));
    }

    let parity = match get(vars, "PRINTER_SERIAL_PARITY") {
        Some(raw) => raw
            .parse()
            .map_err(|e| ImpresoraError::Config(format!("PRINTER_SERIAL_PARITY: {}", e)))?,
        None => Parity::None,
    };

    Ok(TransportConfig::Serial {
        port: require(vars, "PRINTER_SERIAL_PORT")?.to_string(),
        baud_rate,
        byte_size,
        parity,
        stop_bits,
        timeout_secs: parse_or(vars, "PRINTER_SERIAL_TIMEOUT", 1)?,
        dsr_dtr: parse_bool(vars, "PRINTER_SERIAL_DSRDTR")?,
        rts_cts: parse_bool(vars, "PRINTER_SERIAL_RTSCTS")?,
    })
}

fn load_usb(vars: &HashMap<String, String>) -> Result<TransportConfig, ImpresoraError> {
    Ok(TransportConfig::Usb {
        vendor_id: parse_usb_id(require(vars, "PRINTER_USB_VENDOR_ID")?)
            .ok_or_else(|| usb_id_error("PRINTER_USB_VENDOR_ID", vars))?,
        product_id: parse_usb_id(require(vars, "PRINTER_USB_PRODUCT_ID")?)
            .ok_or_else(|| usb_id_error("PRINTER_USB_PRODUCT_ID", vars))?,
        interface: parse_opt(vars, "PRINTER_USB_INTERFACE")?,
        endpoint_out: parse_opt(vars, "PRINTER_USB_ENDPOINT_OUT")?,
    })
}

fn load_format(vars: &HashMap<String, String>) -> Result<FormatDefaults, ImpresoraError> {
    let alignment = match get(vars, "PRINTER_ALIGNMENT") {
        Some(raw) => raw
            .parse()
            .map_err(|e| ImpresoraError::Config(format!("PRINTER_ALIGNMENT: {}", e)))?,
        None => Alignment::Left,
    };

    let font = match get(vars, "PRINTER_FONT") {
        Some(raw) => raw
            .parse()
            .map_err(|e| ImpresoraError::Config(format!("PRINTER_FONT: {}", e)))?,
        None => Font::A,
    };

    let underline: u8 = parse_or(vars, "PRINTER_UNDERLINE", 0)?;
    if underline > 2 {
        return Err(ImpresoraError::Config(format!(
            "PRINTER_UNDERLINE {} is out of range (0-2)",
            underline
        )));
    }

    Ok(FormatDefaults {
        alignment,
        font,
        bold: parse_bool(vars, "PRINTER_BOLD")?,
        underline,
        double_height: parse_bool(vars, "PRINTER_DOUBLE_HEIGHT")?,
        double_width: parse_bool(vars, "PRINTER_DOUBLE_WIDTH")?,
        inverse: parse_bool(vars, "PRINTER_INVERSE")?,
        flip: parse_bool(vars, "PRINTER_FLIP")?,
    })
}

/// Look up a variable, treating empty strings as unset.
fn get<'a>(vars: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn require<'a>(vars: &'a HashMap<String, String>, name: &str) -> Result<&'a str, ImpresoraError> {
    get(vars, name).ok_or_else(|| ImpresoraError::Config(format!("{} must be set", name)))
}

/// Parse a numeric variable, falling back to `default` when unset.
fn parse_or<T: FromStr>(
    vars: &HashMap<String, String>,
    name: &str,
    default: T,
) -> Result<T, ImpresoraError> {
    match get(vars, name) {
        Some(raw) => raw.parse().map_err(|_| {
            ImpresoraError::Config(format!("{} '{}' is not a valid number", name, raw))
        }),
        None => Ok(default),
    }
}

/// Parse an optional numeric variable; unset stays `None`.
fn parse_opt<T: FromStr>(
    vars: &HashMap<String, String>,
    name: &str,
) -> Result<Option<T>, ImpresoraError> {
    match get(vars, name) {
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            ImpresoraError::Config(format!("{} '{}' is not a valid number", name, raw))
        }),
        None => Ok(None),
    }
}

/// Parse a boolean variable. Unset means false.
fn parse_bool(vars: &HashMap<String, String>, name: &str) -> Result<bool, ImpresoraError> {
    match get(vars, name) {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(ImpresoraError::Config(format!(
                "{} '{}' is not a valid boolean",
                name, other
            ))),
        },
        None => Ok(false),
    }
}

/// USB ids accept decimal (`1305`) or hex (`0x0519`) notation.
fn parse_usb_id(raw: &str) -> Option<u16> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).ok()
    } else {
        raw.parse().ok()
    }
}

fn usb_id_error(name: &str, vars: &HashMap<String, String>) -> ImpresoraError {
    ImpresoraError::Config(format!(
        "{} '{}' is not a valid id (decimal or 0x-hex)",
        name,
        get(vars, name).unwrap_or_default()
    ))
}

// ============================================================================
// TESTS
// ============================================================================
