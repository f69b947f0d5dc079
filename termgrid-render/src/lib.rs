//! GPU cell-grid renderer for termgrid.
//!
//! This crate turns a logical character grid into pixels:
//!
//! - Glyph atlas with shelf packing and LRU eviction
//! - Cell encoder producing fixed-layout records for the shader
//! - Per-frame parameters (grid size, text and cursor blink)
//! - Frame slot pool bounding the frames in flight
//! - wgpu driver presenting to a window surface
//! - Software renderer producing identical pixels headlessly

pub mod atlas;
pub mod buffer_pool;
pub mod diagnostics;
pub mod driver;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod frame_params;
pub mod gpu_utils;
pub mod handoff;
pub mod layout;
pub mod pipeline;
pub mod shading;
pub mod software;

// Re-export main public types
pub use atlas::{AtlasUpload, GlyphAtlas, ResidentGlyph, SharedAtlas};
pub use buffer_pool::{FramePool, FrameSlot, SlotRelease};
pub use diagnostics::{
    CollectingDiagnostics, DiagnosticEvent, DiagnosticKind, DiagnosticsSink, LogDiagnostics,
};
pub use driver::{GridRenderer, RendererOptions};
pub use encoder::{CellEncoder, GridSnapshot, LogicalCell};
pub use error::RenderError;
pub use frame::{FrameOutcome, FramePipeline, PipelineSettings, PreparedFrame};
pub use frame_params::{FrameInputs, FrameParameters, Viewport};
pub use handoff::SnapshotHandoff;
pub use layout::{AtlasEntry, CellAttributes, CellFlags, CellRecord, FrameUniforms};
pub use shading::{CursorOverlay, ShadingPolicy, ShadingUniforms};
pub use software::SoftwareRenderer;

// Re-export shared types from dependencies for convenience
pub use termgrid_fonts::{CellMetrics, GlyphKey, GlyphRasterizer, GlyphStyle};
