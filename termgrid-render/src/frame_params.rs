//! Per-frame global parameters: grid size, blink phase, cursor visibility.

use termgrid_fonts::CellMetrics;

use crate::layout::FrameUniforms;

/// Drawable surface size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Everything the builder needs to produce one frame's parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInputs {
    pub viewport: Viewport,
    pub cell_metrics: CellMetrics,
    /// Atlas texture edge length in pixels
    pub atlas_size: u32,
    /// Seconds since the renderer started
    pub elapsed: f64,
    /// Full text blink cycle in seconds
    pub blink_period: f64,
    /// Time the cursor blink cycle last restarted (seconds, same clock as
    /// `elapsed`); `f64::INFINITY` keeps the cursor solid
    pub cursor_blink_phase: f64,
    /// Full cursor blink cycle in seconds
    pub cursor_blink_period: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParameters {
    pub uniforms: FrameUniforms,
    pub cursor_on: bool,
}

/// Number of whole cells that fit in the viewport; remainders are clipped.
///
/// Degenerate (zero, negative, non-finite) cell sizes give an empty grid.
pub fn grid_size(viewport: Viewport, cell: CellMetrics) -> (u32, u32) {
    let fit = |extent: u32, cell_extent: f32| -> u32 {
        if !cell_extent.is_finite() || cell_extent <= 0.0 {
            0
        } else {
            (extent as f32 / cell_extent).floor() as u32
        }
    };
    (
        fit(viewport.width, cell.width),
        fit(viewport.height, cell.height),
    )
}

/// Square wave: on for the first half of each period.
///
/// A non-positive or non-finite period means "always on".
pub fn blink_visible(t: f64, period: f64) -> bool {
    if !period.is_finite() || period <= 0.0 || !t.is_finite() {
        return true;
    }
    t.rem_euclid(period) < period / 2.0
}

/// Build the uniforms and cursor visibility for one frame. Pure.
pub fn build(inputs: &FrameInputs) -> FrameParameters {
    let (cols, rows) = grid_size(inputs.viewport, inputs.cell_metrics);
    let blink_on = blink_visible(inputs.elapsed, inputs.blink_period);

    // Before the cycle restart the cursor stays solid
    let since_restart = inputs.elapsed - inputs.cursor_blink_phase;
    let cursor_on = since_restart < 0.0
        || !since_restart.is_finite()
        || blink_visible(since_restart, inputs.cursor_blink_period);

    FrameParameters {
        uniforms: FrameUniforms {
            viewport_size: [inputs.viewport.width as f32, inputs.viewport.height as f32],
            cell_size: [inputs.cell_metrics.width, inputs.cell_metrics.height],
            atlas_size: [inputs.atlas_size as f32, inputs.atlas_size as f32],
            cols,
            rows,
            time: inputs.elapsed as f32,
            blink_on: blink_on as u32,
        },
        cursor_on,
    }
}
