//! Shared integration test helpers for termgrid.
//!
//! Include with `mod common;` at the top of a test file.

#![allow(dead_code)]

use termgrid_fonts::{CellMetrics, GlyphKey, GlyphRasterizer, RasterizeError, RasterizedGlyph};

/// Rasterizer drawing every glyph as a solid block filling the cell, so
/// tests never depend on installed fonts.
pub struct BlockRasterizer {
    cell: CellMetrics,
}

impl BlockRasterizer {
    pub fn new(cell_w: f32, cell_h: f32) -> Self {
        Self {
            cell: CellMetrics {
                width: cell_w,
                height: cell_h,
                baseline: cell_h * 0.8,
            },
        }
    }
}

impl GlyphRasterizer for BlockRasterizer {
    fn rasterize(&mut self, _key: GlyphKey) -> Result<RasterizedGlyph, RasterizeError> {
        let width = self.cell.width as u32;
        let height = self.cell.height as u32;
        Ok(RasterizedGlyph {
            width,
            height,
            bearing_x: 0.0,
            bearing_y: 0.0,
            pixels: vec![255; width as usize * height as usize * 4],
        })
    }

    fn cell_metrics(&self) -> CellMetrics {
        self.cell
    }
}

/// `[u8; 3]` config color as an opaque RGBA pixel.
pub fn rgba(c: [u8; 3]) -> [u8; 4] {
    [c[0], c[1], c[2], 255]
}
