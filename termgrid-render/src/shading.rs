//! Visual treatment of cell attributes and the cursor overlay.
//!
//! The policy reaches the GPU as [`ShadingUniforms`], a uniform block kept
//! apart from the fixed [`FrameUniforms`](crate::layout::FrameUniforms)
//! layout. The functions below are the CPU reference of the per-cell color
//! resolution: the software renderer calls them directly and
//! `shaders/cell_grid.wgsl` mirrors them step for step.

use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};
use termgrid_config::{Config, CursorStyle, color_u8_to_f32};

use crate::layout::{CellFlags, CellRecord};

/// Width of the beam cursor and height of the underline cursor, in pixels.
pub const CURSOR_LINE_THICKNESS: f32 = 2.0;

/// How decorations and dimming are drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingPolicy {
    /// Foreground multiplier for dim cells
    pub dim_factor: f32,
    /// Underline band top as a fraction of cell height
    pub underline_position: f32,
    /// Band thickness in pixels for underline and strikethrough
    pub underline_thickness: f32,
    /// Strikethrough band top as a fraction of cell height
    pub strikethrough_position: f32,
}

impl Default for ShadingPolicy {
    fn default() -> Self {
        Self {
            dim_factor: 0.5,
            underline_position: 0.9,
            underline_thickness: 1.0,
            strikethrough_position: 0.55,
        }
    }
}

impl ShadingPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            dim_factor: config.dim_factor,
            underline_position: config.underline_position,
            underline_thickness: config.underline_thickness,
            strikethrough_position: config.strikethrough_position,
        }
    }
}

/// Cursor drawn on top of the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorOverlay {
    pub col: u32,
    pub row: u32,
    pub style: CursorStyle,
    pub color: [f32; 4],
}

impl CursorOverlay {
    pub fn new(col: u32, row: u32, config: &Config) -> Self {
        Self {
            col,
            row,
            style: config.cursor_style,
            color: color_u8_to_f32(config.cursor_color),
        }
    }
}

/// Shading parameters uploaded next to the frame uniforms (48 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShadingUniforms {
    pub cursor_color: [f32; 4],
    pub cursor_cell: [u32; 2],
    pub cursor_visible: u32,
    /// [`CursorStyle::shader_code`]
    pub cursor_shape: u32,
    pub dim_factor: f32,
    pub underline_position: f32,
    pub underline_thickness: f32,
    pub strikethrough_position: f32,
}

const _: () = assert!(size_of::<ShadingUniforms>() == 48);
const _: () = assert!(offset_of!(ShadingUniforms, cursor_cell) == 16);
const _: () = assert!(offset_of!(ShadingUniforms, dim_factor) == 32);

impl ShadingUniforms {
    /// `cursor_on` is the blink state; a hidden or absent cursor draws nothing.
    pub fn new(policy: &ShadingPolicy, cursor: Option<&CursorOverlay>, cursor_on: bool) -> Self {
        let (cursor_color, cursor_cell, cursor_shape, visible) = match cursor {
            Some(c) => (c.color, [c.col, c.row], c.style.shader_code(), cursor_on),
            None => ([0.0; 4], [0, 0], 0, false),
        };
        Self {
            cursor_color,
            cursor_cell,
            cursor_visible: visible as u32,
            cursor_shape,
            dim_factor: policy.dim_factor,
            underline_position: policy.underline_position,
            underline_thickness: policy.underline_thickness,
            strikethrough_position: policy.strikethrough_position,
        }
    }

    /// Whether the cursor is drawn on cell (`col`, `row`).
    pub fn cursor_at(&self, col: u32, row: u32) -> bool {
        self.cursor_visible != 0 && self.cursor_cell == [col, row]
    }

    fn cursor_style(&self) -> CursorStyle {
        match self.cursor_shape {
            1 => CursorStyle::Beam,
            2 => CursorStyle::Underline,
            _ => CursorStyle::Block,
        }
    }
}

/// Colors and visibility of one cell after steps 1-5 of shading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedCell {
    pub fg: [f32; 4],
    pub bg: [f32; 4],
    pub draw_glyph: bool,
    pub underline: bool,
    pub strikethrough: bool,
}

pub fn unpack_color(c: [u8; 4]) -> [f32; 4] {
    c.map(|channel| channel as f32 / 255.0)
}

/// Resolve a cell's colors: unpack, inverse, blink, dim, block cursor.
pub fn resolve_cell(
    record: &CellRecord,
    blink_on: bool,
    shading: &ShadingUniforms,
    cursor_here: bool,
) -> ResolvedCell {
    let flags = record.cell_flags();
    let mut fg = unpack_color(record.fg);
    let mut bg = unpack_color(record.bg);

    if flags.contains(CellFlags::INVERSE) {
        std::mem::swap(&mut fg, &mut bg);
    }

    let visible = !(flags.contains(CellFlags::BLINK) && !blink_on);

    if flags.contains(CellFlags::DIM) {
        for channel in &mut fg[..3] {
            *channel *= shading.dim_factor;
        }
    }

    if cursor_here && shading.cursor_style() == CursorStyle::Block {
        fg = bg;
        bg = shading.cursor_color;
    }

    ResolvedCell {
        fg,
        bg,
        draw_glyph: visible && record.has_glyph(),
        underline: visible && flags.contains(CellFlags::UNDERLINE),
        strikethrough: visible && flags.contains(CellFlags::STRIKETHROUGH),
    }
}

/// Vertical extent `[top, bottom)` of a decoration band, kept inside the cell.
pub fn band(position: f32, thickness: f32, cell_height: f32) -> (f32, f32) {
    let thickness = thickness.max(1.0).min(cell_height);
    let top = (position * cell_height)
        .floor()
        .min(cell_height - thickness)
        .max(0.0);
    (top, top + thickness)
}

fn blend(dst: [f32; 4], src: [f32; 3], alpha: f32) -> [f32; 4] {
    [
        dst[0] + (src[0] - dst[0]) * alpha,
        dst[1] + (src[1] - dst[1]) * alpha,
        dst[2] + (src[2] - dst[2]) * alpha,
        dst[3],
    ]
}

/// Color of the pixel whose center is at `local` (cell-relative, pixels).
///
/// `texel` is the atlas texel under the pixel when it falls inside the
/// glyph bitmap. Runs steps 6-9: background, glyph, decorations, line cursors.
pub fn shade_pixel(
    cell: &ResolvedCell,
    local: [f32; 2],
    cell_size: [f32; 2],
    texel: Option<[f32; 4]>,
    shading: &ShadingUniforms,
    cursor_here: bool,
) -> [f32; 4] {
    let mut out = cell.bg;

    if let (true, Some(t)) = (cell.draw_glyph, texel) {
        let glyph_rgb = [cell.fg[0] * t[0], cell.fg[1] * t[1], cell.fg[2] * t[2]];
        out = blend(out, glyph_rgb, t[3] * cell.fg[3]);
    }

    let fg_rgb = [cell.fg[0], cell.fg[1], cell.fg[2]];
    let in_band = |position: f32| {
        let (top, bottom) = band(position, shading.underline_thickness, cell_size[1]);
        local[1] >= top && local[1] < bottom
    };
    if cell.underline && in_band(shading.underline_position) {
        out = blend(out, fg_rgb, cell.fg[3]);
    }
    if cell.strikethrough && in_band(shading.strikethrough_position) {
        out = blend(out, fg_rgb, cell.fg[3]);
    }

    if cursor_here {
        let covered = match shading.cursor_style() {
            CursorStyle::Block => false,
            CursorStyle::Beam => local[0] < CURSOR_LINE_THICKNESS,
            CursorStyle::Underline => local[1] >= cell_size[1] - CURSOR_LINE_THICKNESS,
        };
        if covered {
            let c = shading.cursor_color;
            out = blend(out, [c[0], c[1], c[2]], c[3]);
        }
    }

    out
}
