//! Headless rendering of the demo grid to a PNG.
//!
//! Runs the same frame pipeline as the window, but composes the frame with
//! the software renderer so no GPU or display is needed.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use termgrid_config::{Config, color_u8_to_f32};
use termgrid_fonts::{FontManager, GlyphRasterizer, RasterizerOptions, SwashRasterizer};
use termgrid_render::{
    CursorOverlay, FramePipeline, GlyphAtlas, LogDiagnostics, PipelineSettings, SoftwareRenderer,
    Viewport,
};

use crate::demo::{DemoPalette, demo_screen};

#[derive(Debug, Clone)]
pub struct SnapshotRequest {
    pub config_path: Option<PathBuf>,
    pub output: PathBuf,
    pub cols: Option<usize>,
    pub rows: Option<usize>,
    /// Elapsed seconds for blink phases
    pub time: f64,
}

/// Render one demo frame and write it to `request.output`.
pub fn run(request: &SnapshotRequest) -> Result<PathBuf> {
    let config = crate::app::load_config(request.config_path.as_deref())?;
    crate::logging::apply_config_level(config.log_level);

    let fonts = FontManager::from_config(&config).context("Failed to load fonts")?;
    let rasterizer = SwashRasterizer::new(fonts, RasterizerOptions::from_config(&config, 1.0));

    let image = render_demo(
        &config,
        Box::new(rasterizer),
        request.cols.unwrap_or(config.cols),
        request.rows.unwrap_or(config.rows),
        request.time,
    )?;
    image
        .save(&request.output)
        .with_context(|| format!("Failed to write {}", request.output.display()))?;
    log::info!("Snapshot written to {:?}", request.output);
    Ok(request.output.clone())
}

/// Render a `cols x rows` demo screen with `rasterizer` at `time` seconds.
pub fn render_demo(
    config: &Config,
    rasterizer: Box<dyn GlyphRasterizer>,
    cols: usize,
    rows: usize,
    time: f64,
) -> Result<image::RgbaImage> {
    let cell = rasterizer.cell_metrics();
    let viewport = Viewport::new(
        (cols as f32 * cell.width).ceil() as u32,
        (rows as f32 * cell.height).ceil() as u32,
    );

    let atlas = GlyphAtlas::new(
        config.atlas_size,
        config.atlas_glyph_padding,
        config.max_glyphs as usize,
    );
    let mut pipeline = FramePipeline::new(
        atlas,
        rasterizer,
        Arc::new(LogDiagnostics),
        &PipelineSettings::from_config(config),
    );

    let screen = demo_screen(cols, rows, 0, &DemoPalette::from_config(config));
    let cursor = CursorOverlay::new(screen.cursor.0, screen.cursor.1, config);
    let frame = pipeline.prepare(&screen.grid, 1, viewport, time, Some(cursor));

    let diagnostics = pipeline.diagnostics();
    let atlas = pipeline.atlas();
    let atlas = atlas.read();
    SoftwareRenderer::new(color_u8_to_f32(config.background))
        .render_reported(&frame, &atlas, diagnostics.as_ref())
        .with_context(|| format!("Frame {} was dropped", frame.frame_index))
}
