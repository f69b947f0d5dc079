//! Cell buffer encoder: logical grid to packed [`CellRecord`]s.

use std::collections::HashMap;

use termgrid_fonts::{GlyphKey, GlyphRasterizer, GlyphStyle};

use crate::atlas::GlyphAtlas;
use crate::diagnostics::DiagnosticsSink;
use crate::error::RenderError;
use crate::layout::{CellFlags, CellRecord, GLYPH_INDEX_NONE};

pub use crate::layout::CellAttributes;

/// Glyph substituted when the fallback glyph itself cannot be rasterized.
const LAST_RESORT_GLYPH: char = '?';

/// One cell of the logical terminal grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogicalCell {
    pub ch: char,
    /// RGBA in 0.0 - 1.0
    pub fg: [f32; 4],
    pub bg: [f32; 4],
    pub attrs: CellAttributes,
}

impl LogicalCell {
    pub fn new(ch: char, fg: [f32; 4], bg: [f32; 4]) -> Self {
        Self {
            ch,
            fg,
            bg,
            attrs: CellAttributes::default(),
        }
    }

    pub fn with_attrs(mut self, attrs: CellAttributes) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn is_blank(&self) -> bool {
        self.ch == ' ' || self.ch == '\0'
    }
}

/// Immutable row-major snapshot of the terminal grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSnapshot {
    pub cols: usize,
    pub rows: usize,
    pub cells: Vec<LogicalCell>,
}

impl GridSnapshot {
    /// A `cols x rows` grid filled with `fill`.
    pub fn filled(cols: usize, rows: usize, fill: LogicalCell) -> Self {
        Self {
            cols,
            rows,
            cells: vec![fill; cols * rows],
        }
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<&LogicalCell> {
        if col >= self.cols {
            return None;
        }
        self.cells.get(row * self.cols + col)
    }

    pub fn cell_mut(&mut self, col: usize, row: usize) -> Option<&mut LogicalCell> {
        if col >= self.cols {
            return None;
        }
        self.cells.get_mut(row * self.cols + col)
    }

    /// Write `text` starting at (`col`, `row`), clipped at the row end.
    pub fn write_str(&mut self, col: usize, row: usize, text: &str, template: LogicalCell) {
        for (offset, ch) in text.chars().enumerate() {
            match self.cell_mut(col + offset, row) {
                Some(cell) => *cell = LogicalCell { ch, ..template },
                None => break,
            }
        }
    }
}

/// Quantize a 0.0 - 1.0 RGBA color to 8-bit channels.
///
/// Out-of-range channels are clamped and NaN maps to 0.
pub fn quantize_color(color: [f32; 4]) -> [u8; 4] {
    color.map(|channel| {
        if channel.is_nan() {
            0
        } else {
            (channel.clamp(0.0, 1.0) * 255.0).round() as u8
        }
    })
}

/// Converts logical grids into packed cell records.
#[derive(Debug, Clone)]
pub struct CellEncoder {
    fallback: char,
}

impl Default for CellEncoder {
    fn default() -> Self {
        Self::new('\u{FFFD}')
    }
}

impl CellEncoder {
    pub fn new(fallback: char) -> Self {
        Self { fallback }
    }

    pub fn fallback(&self) -> char {
        self.fallback
    }

    /// Encode `grid` in row-major order.
    ///
    /// Opens a new atlas frame epoch so every glyph this grid needs is
    /// pinned against eviction while the frame is built. Failures degrade
    /// single cells and are reported once per glyph key.
    pub fn encode(
        &self,
        grid: &GridSnapshot,
        atlas: &mut GlyphAtlas,
        rasterizer: &mut dyn GlyphRasterizer,
        diagnostics: &dyn DiagnosticsSink,
    ) -> Vec<CellRecord> {
        let frame = atlas.begin_frame();
        let mut resolved: HashMap<GlyphKey, u16> = HashMap::new();

        grid.cells
            .iter()
            .map(|cell| {
                let flags = CellFlags::from_attributes(cell.attrs);
                let glyph_index = if cell.is_blank() {
                    GLYPH_INDEX_NONE
                } else {
                    let key = GlyphKey::new(
                        cell.ch,
                        GlyphStyle::from_flags(cell.attrs.bold, cell.attrs.italic),
                    );
                    *resolved.entry(key).or_insert_with(|| {
                        self.resolve(key, atlas, rasterizer, diagnostics, frame)
                    })
                };

                CellRecord {
                    glyph_index,
                    fg: quantize_color(cell.fg),
                    bg: quantize_color(cell.bg),
                    flags: flags.bits(),
                    padding: [0; 2],
                }
            })
            .collect()
    }

    /// Resolve a key to a table index, substituting the fallback glyph on
    /// rasterization failure.
    fn resolve(
        &self,
        key: GlyphKey,
        atlas: &mut GlyphAtlas,
        rasterizer: &mut dyn GlyphRasterizer,
        diagnostics: &dyn DiagnosticsSink,
        frame: u64,
    ) -> u16 {
        match atlas.ensure_resident(key, rasterizer) {
            Ok(resident) => resident.index,
            Err(err @ RenderError::RasterizationFailure { .. }) => {
                diagnostics.report(frame, &err);
                [self.fallback, LAST_RESORT_GLYPH]
                    .into_iter()
                    .filter(|&ch| ch != key.ch)
                    .find_map(|ch| {
                        atlas
                            .ensure_resident(GlyphKey::new(ch, key.style), rasterizer)
                            .ok()
                    })
                    .map_or(GLYPH_INDEX_NONE, |resident| resident.index)
            }
            Err(err) => {
                diagnostics.report(frame, &err);
                GLYPH_INDEX_NONE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_clamps_and_rounds() {
        assert_eq!(quantize_color([0.0, 1.0, 0.5, 2.0]), [0, 255, 128, 255]);
        assert_eq!(quantize_color([-1.0, f32::NAN, 0.2, 1.0]), [0, 0, 51, 255]);
    }

    #[test]
    fn test_write_str_clips_at_row_end() {
        let blank = LogicalCell::new(' ', [1.0; 4], [0.0, 0.0, 0.0, 1.0]);
        let mut grid = GridSnapshot::filled(3, 2, blank);
        grid.write_str(1, 0, "abc", blank);
        assert_eq!(grid.cell(1, 0).map(|c| c.ch), Some('a'));
        assert_eq!(grid.cell(2, 0).map(|c| c.ch), Some('b'));
        assert_eq!(grid.cell(0, 1).map(|c| c.ch), Some(' '));
    }
}
