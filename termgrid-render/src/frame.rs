//! Two-phase frame orchestration.
//!
//! Phase 1 ([`FramePipeline::prepare`]) encodes the grid, packs any new
//! glyphs and builds the uniforms. It is the only place the atlas is
//! mutated. The result is a [`PreparedFrame`], handed by value to a
//! renderer for phase 2 (draw), which only reads the atlas.

use std::sync::Arc;

use parking_lot::RwLock;
use termgrid_config::Config;
use termgrid_fonts::{CellMetrics, GlyphRasterizer};

use crate::atlas::{AtlasUpload, GlyphAtlas, SharedAtlas};
use crate::diagnostics::DiagnosticsSink;
use crate::encoder::{CellEncoder, GridSnapshot};
use crate::error::RenderError;
use crate::frame_params::{self, FrameInputs, Viewport};
use crate::layout::{AtlasEntry, CellRecord, FrameUniforms};
use crate::shading::{CursorOverlay, ShadingPolicy, ShadingUniforms};

/// Pipeline tuning taken from the configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub fallback_glyph: char,
    pub text_blink_period: f64,
    pub cursor_blink: bool,
    pub cursor_blink_period: f64,
    pub shading: ShadingPolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            fallback_glyph: '\u{FFFD}',
            text_blink_period: 1.0,
            cursor_blink: true,
            cursor_blink_period: 1.0,
            shading: ShadingPolicy::default(),
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            fallback_glyph: config.fallback_glyph,
            text_blink_period: config.text_blink_period,
            cursor_blink: config.cursor_blink,
            cursor_blink_period: config.cursor_blink_period,
            shading: ShadingPolicy::from_config(config),
        }
    }
}

/// A fully encoded frame, ready to draw.
#[derive(Debug, Clone)]
pub struct PreparedFrame {
    pub frame_index: u64,
    pub cells: Vec<CellRecord>,
    pub uniforms: FrameUniforms,
    pub shading: ShadingUniforms,
    /// Atlas texels changed since the previous frame
    pub atlas_uploads: Vec<AtlasUpload>,
    /// Entry-table slots changed since the previous frame
    pub entry_updates: Vec<(u16, AtlasEntry)>,
    /// Cells were reused from the previous frame without re-encoding
    pub reused_cells: bool,
}

/// Check that the frame carries exactly `cols * rows` cells.
pub fn validate_frame(cells: &[CellRecord], uniforms: &FrameUniforms) -> Result<(), RenderError> {
    let expected = uniforms.cell_count();
    if cells.len() != expected {
        return Err(RenderError::ProtocolMismatch {
            expected,
            actual: cells.len(),
        });
    }
    Ok(())
}

/// Result of drawing a [`PreparedFrame`] that did not hit a fatal error.
#[derive(Debug)]
pub enum FrameOutcome {
    Presented,
    /// The frame was skipped; the error has been reported to diagnostics.
    Dropped(RenderError),
}

impl FrameOutcome {
    pub fn is_presented(&self) -> bool {
        matches!(self, FrameOutcome::Presented)
    }
}

/// Report `err` for `frame_index` and turn it into a dropped outcome.
pub fn drop_frame(
    frame_index: u64,
    err: RenderError,
    diagnostics: &dyn DiagnosticsSink,
) -> FrameOutcome {
    diagnostics.report(frame_index, &err);
    FrameOutcome::Dropped(err)
}

/// Gate shared by every renderer before drawing.
///
/// Returns `None` when the frame may be drawn. A malformed frame is
/// reported once and comes back as [`FrameOutcome::Dropped`].
pub fn admit_frame(
    frame: &PreparedFrame,
    diagnostics: &dyn DiagnosticsSink,
) -> Option<FrameOutcome> {
    validate_frame(&frame.cells, &frame.uniforms)
        .err()
        .map(|err| drop_frame(frame.frame_index, err, diagnostics))
}

struct EncodedGrid {
    generation: u64,
    cols: usize,
    rows: usize,
    cells: Vec<CellRecord>,
}

pub struct FramePipeline {
    atlas: SharedAtlas,
    rasterizer: Box<dyn GlyphRasterizer>,
    diagnostics: Arc<dyn DiagnosticsSink>,
    encoder: CellEncoder,
    settings: PipelineSettings,
    cursor_blink_phase: f64,
    frame_index: u64,
    last_encoded: Option<EncodedGrid>,
}

impl FramePipeline {
    pub fn new(
        atlas: GlyphAtlas,
        rasterizer: Box<dyn GlyphRasterizer>,
        diagnostics: Arc<dyn DiagnosticsSink>,
        settings: &PipelineSettings,
    ) -> Self {
        Self {
            atlas: Arc::new(RwLock::new(atlas)),
            rasterizer,
            diagnostics,
            encoder: CellEncoder::new(settings.fallback_glyph),
            settings: *settings,
            cursor_blink_phase: if settings.cursor_blink {
                0.0
            } else {
                f64::INFINITY
            },
            frame_index: 0,
            last_encoded: None,
        }
    }

    /// Atlas shared for read-only use by renderers.
    pub fn atlas(&self) -> SharedAtlas {
        Arc::clone(&self.atlas)
    }

    pub fn diagnostics(&self) -> Arc<dyn DiagnosticsSink> {
        Arc::clone(&self.diagnostics)
    }

    pub fn cell_metrics(&self) -> CellMetrics {
        self.rasterizer.cell_metrics()
    }

    /// Grid size that fills `viewport` with whole cells.
    pub fn grid_size(&self, viewport: Viewport) -> (u32, u32) {
        frame_params::grid_size(viewport, self.cell_metrics())
    }

    /// Frames prepared so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Restart the cursor blink cycle at `elapsed` (e.g. after typing), so
    /// the cursor shows immediately.
    pub fn restart_cursor_blink(&mut self, elapsed: f64) {
        if self.settings.cursor_blink {
            self.cursor_blink_phase = elapsed;
        }
    }

    /// Phase 1: encode `grid`, pack its glyphs and build the uniforms.
    ///
    /// A grid with the same generation and dimensions as the previous call
    /// reuses the previous records; blinking lives in the uniforms and needs
    /// no re-encode.
    pub fn prepare(
        &mut self,
        grid: &GridSnapshot,
        generation: u64,
        viewport: Viewport,
        elapsed: f64,
        cursor: Option<CursorOverlay>,
    ) -> PreparedFrame {
        self.frame_index += 1;

        let reusable = self.last_encoded.as_ref().is_some_and(|last| {
            last.generation == generation && last.cols == grid.cols && last.rows == grid.rows
        });

        let mut atlas = self.atlas.write();
        let previous = self
            .last_encoded
            .as_ref()
            .filter(|_| reusable)
            .map(|last| last.cells.clone());
        let cells = match previous {
            Some(cells) => cells,
            None => {
                let cells = self.encoder.encode(
                    grid,
                    &mut atlas,
                    self.rasterizer.as_mut(),
                    self.diagnostics.as_ref(),
                );
                self.last_encoded = Some(EncodedGrid {
                    generation,
                    cols: grid.cols,
                    rows: grid.rows,
                    cells: cells.clone(),
                });
                cells
            }
        };

        let params = frame_params::build(&FrameInputs {
            viewport,
            cell_metrics: self.rasterizer.cell_metrics(),
            atlas_size: atlas.size(),
            elapsed,
            blink_period: self.settings.text_blink_period,
            cursor_blink_phase: self.cursor_blink_phase,
            cursor_blink_period: self.settings.cursor_blink_period,
        });
        let shading =
            ShadingUniforms::new(&self.settings.shading, cursor.as_ref(), params.cursor_on);

        let atlas_uploads = atlas.take_pending_uploads();
        let entry_updates = atlas.take_entry_updates();
        drop(atlas);

        if !reusable {
            log::trace!(
                "Frame {}: encoded {} cells (generation {}), {} atlas uploads",
                self.frame_index,
                cells.len(),
                generation,
                atlas_uploads.len()
            );
        }

        PreparedFrame {
            frame_index: self.frame_index,
            cells,
            uniforms: params.uniforms,
            shading,
            atlas_uploads,
            entry_updates,
            reused_cells: reusable,
        }
    }

    /// Drop every cached glyph; the next frame re-encodes from scratch.
    pub fn clear_atlas(&mut self) {
        self.atlas.write().clear();
        self.last_encoded = None;
    }
}
