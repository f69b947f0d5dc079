//! Typed error types for termgrid-render.
//!
//! Callers at the crate boundary match on specific variants instead of
//! relying on opaque `anyhow` strings. The first group degrades a single
//! frame and is routed to a [`DiagnosticsSink`](crate::diagnostics::DiagnosticsSink);
//! the GPU group is fatal for the renderer that produced it.

use std::time::Duration;

use termgrid_fonts::{GlyphKey, RasterizeError};
use thiserror::Error;

/// Top-level error type for the cell-grid renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    // -----------------------------------------------------------------------
    // Degraded frames
    // -----------------------------------------------------------------------
    /// No space (or table slot) could be freed for a glyph.
    #[error("Glyph atlas exhausted: no room for {glyph} ({width}x{height} px)")]
    AtlasExhausted {
        glyph: GlyphKey,
        width: u32,
        height: u32,
    },

    /// The cell array does not match the grid size in the frame uniforms.
    #[error("Cell buffer size mismatch: expected {expected} cells, got {actual}")]
    ProtocolMismatch { expected: usize, actual: usize },

    /// The rasterization service failed or returned a malformed bitmap.
    #[error("Rasterization of {glyph} failed: {source}")]
    RasterizationFailure {
        glyph: GlyphKey,
        #[source]
        source: RasterizeError,
    },

    /// Every frame slot stayed in flight for the whole bounded wait.
    #[error("No frame slot became free within {waited:?}")]
    FramePoolTimeout { waited: Duration },

    // -----------------------------------------------------------------------
    // GPU initialisation
    // -----------------------------------------------------------------------
    /// A suitable wgpu GPU adapter could not be found for the given surface.
    #[error("GPU adapter not found: no compatible GPU adapter available for this surface")]
    AdapterNotFound,

    /// The wgpu device could not be created or the device was lost.
    #[error("GPU device error: {0}")]
    DeviceError(String),

    /// The wgpu surface could not be created for the window.
    #[error("GPU surface creation failed: {0}")]
    SurfaceCreation(String),

    /// The supplied raw RGBA byte slice has an unexpected length.
    #[error("Invalid RGBA data size: expected {expected} bytes, got {actual} bytes")]
    InvalidTextureData { expected: usize, actual: usize },

    // -----------------------------------------------------------------------
    // Surface / presentation
    // -----------------------------------------------------------------------
    /// `Surface::get_current_texture()` failed (timeout, outdated, lost, ...).
    #[error("GPU surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

impl RenderError {
    /// Whether the error only costs the current frame (or cell) and the
    /// render loop should carry on.
    pub fn is_degraded_frame(&self) -> bool {
        matches!(
            self,
            RenderError::AtlasExhausted { .. }
                | RenderError::ProtocolMismatch { .. }
                | RenderError::RasterizationFailure { .. }
                | RenderError::FramePoolTimeout { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Convenience conversions from common upstream error types
// ---------------------------------------------------------------------------

impl From<wgpu::CreateSurfaceError> for RenderError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        RenderError::SurfaceCreation(e.to_string())
    }
}

impl From<wgpu::RequestDeviceError> for RenderError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        RenderError::DeviceError(e.to_string())
    }
}
