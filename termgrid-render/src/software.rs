//! Headless CPU renderer.
//!
//! Draws a [`PreparedFrame`] into an [`RgbaImage`] with the same shading
//! rules as `shaders/cell_grid.wgsl`. Glyph texels are read 1:1 from the
//! atlas pixel store.

use image::{Rgba, RgbaImage};

use crate::atlas::GlyphAtlas;
use crate::diagnostics::DiagnosticsSink;
use crate::error::RenderError;
use crate::frame::{PreparedFrame, admit_frame, validate_frame};
use crate::layout::AtlasEntry;
use crate::shading;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftwareRenderer {
    /// Color of the area outside the grid
    pub background: [f32; 4],
}

impl Default for SoftwareRenderer {
    fn default() -> Self {
        Self {
            background: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl SoftwareRenderer {
    pub fn new(background: [f32; 4]) -> Self {
        Self { background }
    }

    pub fn render(
        &self,
        frame: &PreparedFrame,
        atlas: &GlyphAtlas,
    ) -> Result<RgbaImage, RenderError> {
        validate_frame(&frame.cells, &frame.uniforms)?;
        Ok(self.compose(frame, atlas))
    }

    /// Like [`render`](Self::render), but a malformed frame is reported to
    /// `diagnostics` and dropped instead of returned as an error.
    pub fn render_reported(
        &self,
        frame: &PreparedFrame,
        atlas: &GlyphAtlas,
        diagnostics: &dyn DiagnosticsSink,
    ) -> Option<RgbaImage> {
        if admit_frame(frame, diagnostics).is_some() {
            return None;
        }
        Some(self.compose(frame, atlas))
    }

    fn compose(&self, frame: &PreparedFrame, atlas: &GlyphAtlas) -> RgbaImage {
        let uniforms = &frame.uniforms;
        let width = uniforms.viewport_size[0] as u32;
        let height = uniforms.viewport_size[1] as u32;
        let mut image = RgbaImage::from_pixel(width, height, to_rgba8(self.background));

        let cols = uniforms.cols.max(1);
        let cell_size = uniforms.cell_size;
        let cell_w = cell_size[0].ceil() as u32;
        let cell_h = cell_size[1].ceil() as u32;
        let blink_on = uniforms.blink_on != 0;

        for (i, record) in frame.cells.iter().enumerate() {
            let col = i as u32 % cols;
            let row = i as u32 / cols;
            let cursor_here = frame.shading.cursor_at(col, row);
            let resolved = shading::resolve_cell(record, blink_on, &frame.shading, cursor_here);
            let entry = if resolved.draw_glyph {
                atlas.entry(record.glyph_index)
            } else {
                None
            };

            let origin_x = (col as f32 * cell_size[0]) as u32;
            let origin_y = (row as f32 * cell_size[1]) as u32;
            for py in 0..cell_h {
                for px in 0..cell_w {
                    let (x, y) = (origin_x + px, origin_y + py);
                    if x >= width || y >= height {
                        continue;
                    }
                    let texel = entry.and_then(|entry| glyph_texel(&entry, atlas, [px, py]));
                    let local = [px as f32 + 0.5, py as f32 + 0.5];
                    let color = shading::shade_pixel(
                        &resolved,
                        local,
                        cell_size,
                        texel,
                        &frame.shading,
                        cursor_here,
                    );
                    image.put_pixel(x, y, to_rgba8(color));
                }
            }
        }

        image
    }
}

/// Atlas texel under cell pixel `pixel`, if it falls inside the glyph bitmap.
fn glyph_texel(entry: &AtlasEntry, atlas: &GlyphAtlas, pixel: [u32; 2]) -> Option<[f32; 4]> {
    if entry.is_empty() {
        return None;
    }
    let gx = pixel[0] as i64 - entry.bearing[0].floor() as i64;
    let gy = pixel[1] as i64 - entry.bearing[1].floor() as i64;
    if gx < 0 || gy < 0 || gx >= entry.size[0] as i64 || gy >= entry.size[1] as i64 {
        return None;
    }

    let size = atlas.size() as f32;
    let tx = (entry.uv_rect[0] * size).round() as i64 + gx;
    let ty = (entry.uv_rect[1] * size).round() as i64 + gy;
    let offset = ((ty * atlas.size() as i64 + tx) * 4) as usize;
    let texel = atlas.pixels().get(offset..offset + 4)?;
    Some([
        texel[0] as f32 / 255.0,
        texel[1] as f32 / 255.0,
        texel[2] as f32 / 255.0,
        texel[3] as f32 / 255.0,
    ])
}

fn to_rgba8(color: [f32; 4]) -> Rgba<u8> {
    Rgba(color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
}
