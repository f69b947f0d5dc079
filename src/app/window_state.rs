//! Per-window state: the window, the GPU renderer, the frame pipeline and
//! the demo producer feeding it.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use termgrid_config::Config;
use termgrid_fonts::{FontManager, RasterizerOptions, SwashRasterizer};
use termgrid_render::{
    CursorOverlay, DiagnosticsSink, FrameOutcome, FramePipeline, GlyphAtlas, GridRenderer,
    LogDiagnostics, PipelineSettings, RenderError, RendererOptions, SnapshotHandoff, Viewport,
};
use tokio::runtime::Runtime;
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

use crate::demo::{DemoPalette, DemoProducer, demo_screen};

pub struct WindowState {
    pub(crate) config: Config,
    pub(crate) window: Arc<Window>,
    pub(crate) renderer: GridRenderer,
    pub(crate) pipeline: FramePipeline,
    pub(crate) handoff: Arc<SnapshotHandoff>,
    pub(crate) demo: DemoProducer,
    diagnostics: Arc<dyn DiagnosticsSink>,
    started: Instant,
}

impl WindowState {
    /// Create the window sized to the configured grid, then the renderer and
    /// the demo producer.
    pub fn new(event_loop: &ActiveEventLoop, config: &Config, runtime: &Runtime) -> Result<Self> {
        // Hidden until sized: the cell size depends on the scale factor
        let attributes = WindowAttributes::default()
            .with_title(config.window_title.clone())
            .with_visible(false);
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("Failed to create window")?,
        );

        let diagnostics: Arc<dyn DiagnosticsSink> = Arc::new(LogDiagnostics);
        let mut renderer = runtime
            .block_on(GridRenderer::new(
                Arc::clone(&window),
                &RendererOptions::from_config(config),
                Arc::clone(&diagnostics),
            ))
            .context("Failed to initialize GPU renderer")?;

        let pipeline = build_pipeline(
            config,
            window.scale_factor() as f32,
            &renderer,
            Arc::clone(&diagnostics),
        )?;

        let cell = pipeline.cell_metrics();
        let requested = PhysicalSize::new(
            (config.cols as f32 * cell.width).ceil() as u32,
            (config.rows as f32 * cell.height).ceil() as u32,
        );
        if let Some(size) = window.request_inner_size(requested) {
            log::debug!("Window size applied immediately: {:?}", size);
        }
        window.set_visible(true);

        let size = window.inner_size();
        renderer.resize(size.width, size.height);

        let viewport = viewport_of(&renderer);
        let (cols, rows) = pipeline.grid_size(viewport);
        let palette = DemoPalette::from_config(config);
        let handoff = Arc::new(SnapshotHandoff::new(
            demo_screen(cols as usize, rows as usize, 0, &palette).grid,
        ));
        let demo = DemoProducer::spawn(
            runtime,
            Arc::clone(&handoff),
            palette,
            cols as usize,
            rows as usize,
        );

        log::info!(
            "Window ready: {}x{} px, {}x{} cells",
            viewport.width,
            viewport.height,
            cols,
            rows
        );

        Ok(Self {
            config: config.clone(),
            window,
            renderer,
            pipeline,
            handoff,
            demo,
            diagnostics,
            started: Instant::now(),
        })
    }

    fn elapsed(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Follow a window resize: reconfigure the surface and resize the grid.
    pub fn handle_resize(&mut self, width: u32, height: u32) {
        self.renderer.resize(width, height);
        self.sync_grid_size();
        self.window.request_redraw();
    }

    /// Rebuild fonts and atlas for a new scale factor.
    pub fn handle_scale_factor_change(&mut self, scale_factor: f64) {
        match build_pipeline(
            &self.config,
            scale_factor as f32,
            &self.renderer,
            Arc::clone(&self.diagnostics),
        ) {
            Ok(pipeline) => {
                log::info!("Scale factor changed to {}, glyphs re-rasterized", scale_factor);
                self.pipeline = pipeline;
                self.sync_grid_size();
            }
            Err(e) => log::error!("Failed to rebuild fonts for scale {}: {:#}", scale_factor, e),
        }
    }

    /// Input activity restarts the cursor blink cycle.
    pub fn handle_key_press(&mut self) {
        let elapsed = self.elapsed();
        self.pipeline.restart_cursor_blink(elapsed);
    }

    fn sync_grid_size(&self) {
        let (cols, rows) = self.pipeline.grid_size(viewport_of(&self.renderer));
        self.demo.resize(cols as usize, rows as usize);
    }

    /// Draw the latest published snapshot.
    pub fn render(&mut self) {
        let (grid, generation) = self.handoff.load();
        let viewport = viewport_of(&self.renderer);
        let (col, row) = self.demo.cursor();
        let cursor = CursorOverlay::new(col, row, &self.config);
        let elapsed = self.elapsed();

        let frame = self
            .pipeline
            .prepare(&grid, generation, viewport, elapsed, Some(cursor));

        match self.renderer.render(&frame) {
            Ok(FrameOutcome::Presented) => {}
            Ok(FrameOutcome::Dropped(e)) => {
                log::debug!("Frame {} dropped: {}", frame.frame_index, e);
            }
            Err(RenderError::Surface(surface_error)) => match surface_error {
                SurfaceError::Outdated | SurfaceError::Lost => {
                    log::warn!(
                        "Surface error detected ({:?}), reconfiguring...",
                        surface_error
                    );
                    self.renderer.reconfigure_surface();
                }
                SurfaceError::Timeout => {
                    log::warn!("Surface timeout, will retry next frame");
                    self.window.request_redraw();
                }
                SurfaceError::OutOfMemory => {
                    log::error!("Surface out of memory: {:?}", surface_error);
                }
                _ => {
                    log::error!("Surface error: {:?}", surface_error);
                }
            },
            Err(e) => log::error!("Render error: {}", e),
        }
    }
}

fn viewport_of(renderer: &GridRenderer) -> Viewport {
    let (width, height) = renderer.surface_size();
    Viewport::new(width, height)
}

/// Fonts, rasterizer, atlas and pipeline for `scale_factor`. The atlas
/// matches the renderer's (device-clamped) texture and entry table.
fn build_pipeline(
    config: &Config,
    scale_factor: f32,
    renderer: &GridRenderer,
    diagnostics: Arc<dyn DiagnosticsSink>,
) -> Result<FramePipeline> {
    let fonts = FontManager::from_config(config).context("Failed to load fonts")?;
    let options = RasterizerOptions::from_config(config, scale_factor);
    log::info!(
        "Rasterizing at {:.1}px (scale factor {})",
        options.font_size_px,
        scale_factor
    );
    let rasterizer = SwashRasterizer::new(fonts, options);

    let atlas = GlyphAtlas::new(
        renderer.atlas_size(),
        config.atlas_glyph_padding,
        renderer.entry_capacity(),
    );
    Ok(FramePipeline::new(
        atlas,
        Box::new(rasterizer),
        diagnostics,
        &PipelineSettings::from_config(config),
    ))
}
