//! # Dummy Backend
//!
//! An in-memory backend that accepts every operation without touching
//! hardware. It records each operation in order and counts writes, so
//! tests can assert on the exact sequence a request produced. Selected
//! with `PRINTER_TYPE=dummy`, which is also the hardware-free way to run
//! health checks.

use std::sync::{Arc, Mutex};

use crate::config::{Alignment, FormatDefaults};
use crate::error::ImpresoraError;

use super::{BarcodeJob, ImageJob, PrintBackend};

/// One recorded printer operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    ApplyDefaults { alignment: Alignment },
    Justify(Alignment),
    Text(String),
    Qr { content: String, size: u8 },
    Barcode { code: String, kind: String, height: u8, width: u8 },
    Image { mode: String, bytes: usize },
    Feed(u8),
    Cut,
}

/// Shared view of everything a [`DummyBackend`] has recorded.
///
/// Handlers own the backend behind the state mutex, so tests keep a
/// [`Recorder`] handle taken before the backend was boxed.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    inner: Arc<Mutex<Vec<Op>>>,
}

impl Recorder {
    /// Snapshot of the recorded operations, in issue order.
    pub fn ops(&self) -> Vec<Op> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of operations written so far.
    pub fn writes(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn push(&self, op: Op) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).push(op);
    }
}

/// Recording no-op printer backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    recorder: Recorder,
}

impl DummyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for inspecting recorded operations after the backend moved
    /// into the server state.
    pub fn recorder(&self) -> Recorder {
        self.recorder.clone()
    }
}

impl PrintBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "dummy"
    }

    fn is_online(&mut self) -> bool {
        true
    }

    fn apply_defaults(&mut self, format: &FormatDefaults) -> Result<(), ImpresoraError> {
        self.recorder.push(Op::ApplyDefaults {
            alignment: format.alignment,
        });
        Ok(())
    }

    fn justify(&mut self, alignment: Alignment) -> Result<(), ImpresoraError> {
        self.recorder.push(Op::Justify(alignment));
        Ok(())
    }

    fn print_text(&mut self, text: &str) -> Result<(), ImpresoraError> {
        self.recorder.push(Op::Text(text.to_string()));
        Ok(())
    }

    fn print_qr(&mut self, content: &str, size: u8) -> Result<(), ImpresoraError> {
        self.recorder.push(Op::Qr {
            content: content.to_string(),
            size,
        });
        Ok(())
    }

    fn print_barcode(&mut self, job: &BarcodeJob) -> Result<(), ImpresoraError> {
        self.recorder.push(Op::Barcode {
            code: job.code.clone(),
            kind: job.kind.to_string(),
            height: job.height,
            width: job.width,
        });
        Ok(())
    }

    fn print_image(&mut self, job: &ImageJob) -> Result<(), ImpresoraError> {
        self.recorder.push(Op::Image {
            mode: format!("{:?}", job.mode),
            bytes: job.bytes.len(),
        });
        Ok(())
    }

    fn feed(&mut self, lines: u8) -> Result<(), ImpresoraError> {
        self.recorder.push(Op::Feed(lines));
        Ok(())
    }

    fn cut(&mut self) -> Result<(), ImpresoraError> {
        self.recorder.push(Op::Cut);
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
