//! Shared integration test helpers for termgrid-render.
//!
//! Include with `mod common;` at the top of a test file. The rasterizer here
//! produces solid synthetic glyphs so no test depends on installed fonts.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use termgrid_fonts::{
    CellMetrics, GlyphKey, GlyphRasterizer, RasterizeError, RasterizedGlyph,
};
use termgrid_render::{
    CollectingDiagnostics, FramePipeline, GlyphAtlas, GridSnapshot, LogicalCell, PipelineSettings,
};

pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
pub const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Rasterizer returning opaque white rectangles.
#[derive(Debug, Clone)]
pub struct SyntheticRasterizer {
    pub cell: CellMetrics,
    pub glyph_size: (u32, u32),
    pub bearing: (f32, f32),
    pub sizes: HashMap<char, (u32, u32)>,
    pub missing: HashSet<char>,
    pub calls: Vec<GlyphKey>,
}

impl SyntheticRasterizer {
    /// `cell_w x cell_h` cells with `glyph_w x glyph_h` glyphs at the cell origin.
    pub fn new(cell_w: f32, cell_h: f32, glyph_w: u32, glyph_h: u32) -> Self {
        Self {
            cell: CellMetrics {
                width: cell_w,
                height: cell_h,
                baseline: cell_h * 0.8,
            },
            glyph_size: (glyph_w, glyph_h),
            bearing: (0.0, 0.0),
            sizes: HashMap::new(),
            missing: HashSet::new(),
            calls: Vec::new(),
        }
    }

    pub fn with_size(mut self, ch: char, width: u32, height: u32) -> Self {
        self.sizes.insert(ch, (width, height));
        self
    }

    pub fn with_missing(mut self, ch: char) -> Self {
        self.missing.insert(ch);
        self
    }

    pub fn with_bearing(mut self, x: f32, y: f32) -> Self {
        self.bearing = (x, y);
        self
    }
}

impl GlyphRasterizer for SyntheticRasterizer {
    fn rasterize(&mut self, key: GlyphKey) -> Result<RasterizedGlyph, RasterizeError> {
        self.calls.push(key);
        if self.missing.contains(&key.ch) {
            return Err(RasterizeError::GlyphNotFound(key));
        }
        let (width, height) = self.sizes.get(&key.ch).copied().unwrap_or(self.glyph_size);
        Ok(RasterizedGlyph {
            width,
            height,
            bearing_x: self.bearing.0,
            bearing_y: self.bearing.1,
            pixels: vec![255; width as usize * height as usize * 4],
        })
    }

    fn cell_metrics(&self) -> CellMetrics {
        self.cell
    }
}

/// A blank cell with the given colors.
pub fn blank_cell(fg: [f32; 4], bg: [f32; 4]) -> LogicalCell {
    LogicalCell::new(' ', fg, bg)
}

/// A `cols x rows` grid of white-on-black blanks.
pub fn blank_grid(cols: usize, rows: usize) -> GridSnapshot {
    GridSnapshot::filled(cols, rows, blank_cell(WHITE, BLACK))
}

/// Frame pipeline over a synthetic rasterizer, with collected diagnostics.
pub fn pipeline_with(
    rasterizer: SyntheticRasterizer,
    atlas: GlyphAtlas,
) -> (FramePipeline, Arc<CollectingDiagnostics>) {
    let diagnostics = Arc::new(CollectingDiagnostics::new());
    let pipeline = FramePipeline::new(
        atlas,
        Box::new(rasterizer),
        diagnostics.clone(),
        &PipelineSettings::default(),
    );
    (pipeline, diagnostics)
}

/// Two UV rectangles share any area.
pub fn uv_overlap(a: [f32; 4], b: [f32; 4]) -> bool {
    a[0] < b[2] && b[0] < a[2] && a[1] < b[3] && b[1] < a[3]
}
