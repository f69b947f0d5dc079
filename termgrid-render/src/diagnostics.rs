//! Where degraded-frame errors go.
//!
//! Atlas exhaustion, rasterization failures, protocol mismatches and frame
//! pool timeouts never abort the render loop; they are reported here.

use parking_lot::Mutex;

use crate::error::RenderError;

/// Receiver of degraded-frame errors.
pub trait DiagnosticsSink: Send + Sync {
    fn report(&self, frame: u64, error: &RenderError);
}

/// Logs every report at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl DiagnosticsSink for LogDiagnostics {
    fn report(&self, frame: u64, error: &RenderError) {
        log::warn!("Frame {}: {}", frame, error);
    }
}

/// Coarse classification of a reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    AtlasExhausted,
    ProtocolMismatch,
    RasterizationFailure,
    FramePoolTimeout,
    Other,
}

impl DiagnosticKind {
    pub fn of(error: &RenderError) -> Self {
        match error {
            RenderError::AtlasExhausted { .. } => DiagnosticKind::AtlasExhausted,
            RenderError::ProtocolMismatch { .. } => DiagnosticKind::ProtocolMismatch,
            RenderError::RasterizationFailure { .. } => DiagnosticKind::RasterizationFailure,
            RenderError::FramePoolTimeout { .. } => DiagnosticKind::FramePoolTimeout,
            _ => DiagnosticKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEvent {
    pub frame: u64,
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Records every report in memory.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.events.lock().iter().filter(|e| e.kind == kind).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl DiagnosticsSink for CollectingDiagnostics {
    fn report(&self, frame: u64, error: &RenderError) {
        self.events.lock().push(DiagnosticEvent {
            frame,
            kind: DiagnosticKind::of(error),
            message: error.to_string(),
        });
    }
}
