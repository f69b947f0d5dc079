//! Frame preparation and the software renderer.

mod common;

use common::{BLACK, SyntheticRasterizer, WHITE, blank_cell, blank_grid, pipeline_with};
use termgrid_config::CursorStyle;
use termgrid_fonts::CellMetrics;
use termgrid_render::frame::{admit_frame, validate_frame};
use termgrid_render::frame_params::grid_size;
use termgrid_render::{
    CellAttributes, CursorOverlay, DiagnosticKind, FrameOutcome, FramePipeline, GlyphAtlas,
    GridSnapshot, LogicalCell, RenderError, SoftwareRenderer, Viewport,
};

const CELL_W: f32 = 10.0;
const CELL_H: f32 = 20.0;

/// 4x6 glyphs placed at (2, 3) inside 10x20 cells.
fn rasterizer() -> SyntheticRasterizer {
    SyntheticRasterizer::new(CELL_W, CELL_H, 4, 6).with_bearing(2.0, 3.0)
}

fn pipeline() -> FramePipeline {
    pipeline_with(rasterizer(), GlyphAtlas::new(128, 1, 256)).0
}

fn render(pipeline: &mut FramePipeline, grid: &GridSnapshot, elapsed: f64) -> image::RgbaImage {
    render_with_cursor(pipeline, grid, elapsed, None)
}

fn render_with_cursor(
    pipeline: &mut FramePipeline,
    grid: &GridSnapshot,
    elapsed: f64,
    cursor: Option<CursorOverlay>,
) -> image::RgbaImage {
    let viewport = Viewport::new(
        grid.cols as u32 * CELL_W as u32,
        grid.rows as u32 * CELL_H as u32,
    );
    let frame = pipeline.prepare(grid, 1, viewport, elapsed, cursor);
    let atlas = pipeline.atlas();
    let atlas = atlas.read();
    SoftwareRenderer::default()
        .render(&frame, &atlas)
        .expect("grid matches viewport")
}

fn single_cell(ch: char, attrs: CellAttributes) -> GridSnapshot {
    GridSnapshot::filled(1, 1, LogicalCell::new(ch, WHITE, BLACK).with_attrs(attrs))
}

#[test]
fn test_viewport_800x400_gives_80x20_grid() {
    let cell = CellMetrics {
        width: CELL_W,
        height: CELL_H,
        baseline: 16.0,
    };
    assert_eq!(grid_size(Viewport::new(800, 400), cell), (80, 20));
    assert_eq!(grid_size(Viewport::new(809, 419), cell), (80, 20));

    let mut pipeline = pipeline();
    let frame = pipeline.prepare(&blank_grid(80, 20), 1, Viewport::new(800, 400), 0.0, None);
    assert_eq!((frame.uniforms.cols, frame.uniforms.rows), (80, 20));
    assert_eq!(frame.cells.len(), 1600);
    assert_eq!(frame.uniforms.cell_size, [CELL_W, CELL_H]);
    assert_eq!(frame.uniforms.atlas_size, [128.0, 128.0]);
}

#[test]
fn test_short_cell_buffer_is_protocol_mismatch() {
    let mut pipeline = pipeline();
    let mut frame = pipeline.prepare(&blank_grid(80, 20), 1, Viewport::new(800, 400), 0.0, None);
    frame.cells.pop();

    let err = validate_frame(&frame.cells, &frame.uniforms).unwrap_err();
    assert!(matches!(
        err,
        RenderError::ProtocolMismatch {
            expected: 1600,
            actual: 1599
        }
    ));

    let atlas = pipeline.atlas();
    let result = SoftwareRenderer::default().render(&frame, &atlas.read());
    assert!(matches!(result, Err(RenderError::ProtocolMismatch { .. })));
}

#[test]
fn test_short_cell_buffer_is_reported_once_and_dropped() {
    let (mut pipeline, diagnostics) = pipeline_with(rasterizer(), GlyphAtlas::new(128, 1, 256));
    let mut frame = pipeline.prepare(&blank_grid(80, 20), 7, Viewport::new(800, 400), 0.0, None);
    frame.cells.pop();

    let outcome = admit_frame(&frame, diagnostics.as_ref());
    assert!(matches!(
        outcome,
        Some(FrameOutcome::Dropped(RenderError::ProtocolMismatch {
            expected: 1600,
            actual: 1599
        }))
    ));
    let events = diagnostics.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].frame, 7);
    assert_eq!(events[0].kind, DiagnosticKind::ProtocolMismatch);
    assert_eq!(diagnostics.count(DiagnosticKind::ProtocolMismatch), 1);
}

#[test]
fn test_well_formed_frame_is_admitted_silently() {
    let (mut pipeline, diagnostics) = pipeline_with(rasterizer(), GlyphAtlas::new(128, 1, 256));
    let frame = pipeline.prepare(&blank_grid(80, 20), 1, Viewport::new(800, 400), 0.0, None);

    assert!(admit_frame(&frame, diagnostics.as_ref()).is_none());
    assert!(diagnostics.events().is_empty());
}

#[test]
fn test_software_renderer_reports_dropped_frame() {
    let (mut pipeline, diagnostics) = pipeline_with(rasterizer(), GlyphAtlas::new(128, 1, 256));
    let mut frame = pipeline.prepare(&blank_grid(80, 20), 3, Viewport::new(800, 400), 0.0, None);
    frame.cells.pop();

    let atlas = pipeline.atlas();
    let image =
        SoftwareRenderer::default().render_reported(&frame, &atlas.read(), diagnostics.as_ref());
    assert!(image.is_none());
    assert_eq!(diagnostics.count(DiagnosticKind::ProtocolMismatch), 1);
    assert_eq!(diagnostics.events().len(), 1);

    frame.cells.push(frame.cells[0]);
    let image =
        SoftwareRenderer::default().render_reported(&frame, &atlas.read(), diagnostics.as_ref());
    assert_eq!(image.map(|i| i.dimensions()), Some((800, 400)));
    assert_eq!(diagnostics.events().len(), 1);
}

#[test]
fn test_stale_grid_after_resize_is_rejected() {
    let mut pipeline = pipeline();
    // Window shrank by one column but the producer has not republished yet
    let frame = pipeline.prepare(&blank_grid(80, 20), 1, Viewport::new(790, 400), 0.0, None);
    assert_eq!(frame.uniforms.cols, 79);

    let err = validate_frame(&frame.cells, &frame.uniforms).unwrap_err();
    assert!(err.is_degraded_frame());
    assert_eq!(DiagnosticKind::of(&err), DiagnosticKind::ProtocolMismatch);
}

#[test]
fn test_inverse_swaps_before_drawing() {
    let mut pipeline = pipeline();
    let inverse = CellAttributes {
        inverse: true,
        ..CellAttributes::default()
    };
    let image = render(&mut pipeline, &single_cell('X', inverse), 0.0);

    assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 255], "background is white");
    assert_eq!(image.get_pixel(3, 4).0, [0, 0, 0, 255], "glyph is black");
}

#[test]
fn test_inverse_blink_off_shows_swapped_background_only() {
    let mut pipeline = pipeline();
    let attrs = CellAttributes {
        inverse: true,
        blink: true,
        ..CellAttributes::default()
    };
    let image = render(&mut pipeline, &single_cell('X', attrs), 0.6);

    assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 255]);
    assert_eq!(image.get_pixel(3, 4).0, [255, 255, 255, 255], "glyph suppressed");
}

#[test]
fn test_blinking_text_follows_blink_phase() {
    let mut pipeline = pipeline();
    let grid = single_cell(
        'B',
        CellAttributes {
            blink: true,
            ..CellAttributes::default()
        },
    );

    let visible = render(&mut pipeline, &grid, 0.0);
    assert_eq!(visible.get_pixel(3, 4).0, [255, 255, 255, 255]);

    let hidden = render(&mut pipeline, &grid, 0.6);
    assert_eq!(hidden.get_pixel(3, 4).0, [0, 0, 0, 255]);
}

#[test]
fn test_glyph_drawn_only_inside_its_bitmap() {
    let mut pipeline = pipeline();
    let image = render(&mut pipeline, &single_cell('g', CellAttributes::default()), 0.0);

    for y in 0..20 {
        for x in 0..10 {
            let inside = (2..6).contains(&x) && (3..9).contains(&y);
            let expected = if inside { 255 } else { 0 };
            assert_eq!(image.get_pixel(x, y).0[0], expected, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn test_dim_halves_foreground() {
    let mut pipeline = pipeline();
    let dim = CellAttributes {
        dim: true,
        ..CellAttributes::default()
    };
    let image = render(&mut pipeline, &single_cell('d', dim), 0.0);
    assert_eq!(image.get_pixel(3, 4).0, [128, 128, 128, 255]);
}

#[test]
fn test_underline_and_strikethrough_bands() {
    let mut pipeline = pipeline();
    let attrs = CellAttributes {
        underline: true,
        strikethrough: true,
        ..CellAttributes::default()
    };
    let image = render(&mut pipeline, &single_cell(' ', attrs), 0.0);

    // Underline at 0.9 * 20, strikethrough at 0.55 * 20, one pixel each
    assert_eq!(image.get_pixel(0, 18).0, [255, 255, 255, 255]);
    assert_eq!(image.get_pixel(9, 11).0, [255, 255, 255, 255]);
    assert_eq!(image.get_pixel(0, 17).0, [0, 0, 0, 255]);
    assert_eq!(image.get_pixel(0, 19).0, [0, 0, 0, 255]);
}

#[test]
fn test_cursor_styles() {
    let red = [1.0, 0.0, 0.0, 1.0];
    let grid = blank_grid(2, 1);

    let mut pipeline = pipeline();
    let block = CursorOverlay {
        col: 1,
        row: 0,
        style: CursorStyle::Block,
        color: red,
    };
    let image = render_with_cursor(&mut pipeline, &grid, 0.0, Some(block));
    assert_eq!(image.get_pixel(15, 10).0, [255, 0, 0, 255]);
    assert_eq!(image.get_pixel(5, 10).0, [0, 0, 0, 255]);

    let beam = CursorOverlay {
        style: CursorStyle::Beam,
        ..block
    };
    let image = render_with_cursor(&mut pipeline, &grid, 0.0, Some(beam));
    assert_eq!(image.get_pixel(11, 10).0, [255, 0, 0, 255]);
    assert_eq!(image.get_pixel(12, 10).0, [0, 0, 0, 255]);

    let underline = CursorOverlay {
        style: CursorStyle::Underline,
        ..block
    };
    let image = render_with_cursor(&mut pipeline, &grid, 0.0, Some(underline));
    assert_eq!(image.get_pixel(15, 18).0, [255, 0, 0, 255]);
    assert_eq!(image.get_pixel(15, 17).0, [0, 0, 0, 255]);
}

#[test]
fn test_cursor_hidden_in_blink_off_phase() {
    let mut pipeline = pipeline();
    let cursor = CursorOverlay {
        col: 0,
        row: 0,
        style: CursorStyle::Block,
        color: [1.0, 0.0, 0.0, 1.0],
    };
    let image = render_with_cursor(&mut pipeline, &blank_grid(1, 1), 0.6, Some(cursor));
    assert_eq!(image.get_pixel(5, 10).0, [0, 0, 0, 255]);

    // Typing restarts the cycle and shows the cursor at once
    pipeline.restart_cursor_blink(0.55);
    let image = render_with_cursor(&mut pipeline, &blank_grid(1, 1), 0.6, Some(cursor));
    assert_eq!(image.get_pixel(5, 10).0, [255, 0, 0, 255]);
}

#[test]
fn test_unchanged_generation_reuses_cells() {
    let (mut pipeline, diagnostics) = pipeline_with(rasterizer(), GlyphAtlas::new(128, 1, 256));
    let mut grid = blank_grid(4, 2);
    grid.write_str(0, 0, "abcd", blank_cell(WHITE, BLACK));
    let viewport = Viewport::new(40, 40);

    let first = pipeline.prepare(&grid, 7, viewport, 0.0, None);
    assert!(!first.reused_cells);
    assert_eq!(first.atlas_uploads.len(), 4);
    assert_eq!(first.entry_updates.len(), 4);

    let second = pipeline.prepare(&grid, 7, viewport, 0.6, None);
    assert!(second.reused_cells);
    assert_eq!(second.cells, first.cells);
    assert!(second.atlas_uploads.is_empty());
    assert_ne!(second.uniforms.blink_on, first.uniforms.blink_on);
    assert_eq!(second.frame_index, first.frame_index + 1);

    let third = pipeline.prepare(&grid, 8, viewport, 0.6, None);
    assert!(!third.reused_cells);
    assert_eq!(third.cells, first.cells);
    assert!(diagnostics.events().is_empty());
}

#[test]
fn test_clear_atlas_forces_reencode() {
    let mut pipeline = pipeline();
    let mut grid = blank_grid(2, 1);
    grid.write_str(0, 0, "hi", blank_cell(WHITE, BLACK));
    let viewport = Viewport::new(20, 20);

    pipeline.prepare(&grid, 1, viewport, 0.0, None);
    pipeline.clear_atlas();
    let frame = pipeline.prepare(&grid, 1, viewport, 0.0, None);

    assert!(!frame.reused_cells);
    // Full clear first, then the two glyphs again
    assert_eq!(frame.atlas_uploads.len(), 3);
    assert_eq!(frame.atlas_uploads[0].width, 128);
}

#[test]
fn test_area_outside_grid_uses_renderer_background() {
    let mut pipeline = pipeline();
    let frame = pipeline.prepare(&blank_grid(1, 1), 1, Viewport::new(15, 25), 0.0, None);
    let atlas = pipeline.atlas();
    let image = SoftwareRenderer::new([0.0, 0.0, 1.0, 1.0])
        .render(&frame, &atlas.read())
        .unwrap();

    assert_eq!(image.dimensions(), (15, 25));
    assert_eq!(image.get_pixel(12, 5).0, [0, 0, 255, 255]);
    assert_eq!(image.get_pixel(5, 22).0, [0, 0, 255, 255]);
    assert_eq!(image.get_pixel(5, 5).0, [0, 0, 0, 255]);
}
