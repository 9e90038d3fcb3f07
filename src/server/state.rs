//! Server state and configuration.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::backend::PrintBackend;
use crate::config::PrinterConfig;
use crate::error::ImpresoraError;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8000")
    pub listen_addr: String,
}

/// Application state shared across handlers.
///
/// The backend sits behind one mutex: ESC/POS is a stateful byte stream,
/// so a job's whole command sequence must hold the lock from formatting
/// through the final cut. Handlers take the guard inside
/// `tokio::task::spawn_blocking`, which keeps concurrent HTTP requests
/// from interleaving printer bytes.
pub struct AppState {
    pub config: PrinterConfig,
    printer: Arc<Mutex<Box<dyn PrintBackend>>>,
}

impl AppState {
    pub fn new(config: PrinterConfig, printer: Box<dyn PrintBackend>) -> Self {
        Self {
            config,
            printer: Arc::new(Mutex::new(printer)),
        }
    }

    /// Lock the printer for one job's critical section.
    ///
    /// A poisoned lock means a previous job panicked mid-write; the printer
    /// state is unknown, so surface it as a transport error instead of
    /// propagating the panic.
    pub fn printer(&self) -> Result<MutexGuard<'_, Box<dyn PrintBackend>>, ImpresoraError> {
        self.printer
            .lock()
            .map_err(|_| ImpresoraError::Transport("printer lock poisoned".to_string()))
    }
}
