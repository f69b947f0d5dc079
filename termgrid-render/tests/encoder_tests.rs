//! Cell encoding: layout, determinism, attribute round trip, degraded cells.

mod common;

use common::{BLACK, SyntheticRasterizer, WHITE, blank_cell, blank_grid};
use termgrid_fonts::{GlyphKey, GlyphStyle};
use termgrid_render::layout::GLYPH_INDEX_NONE;
use termgrid_render::{
    CellAttributes, CellEncoder, CellFlags, CollectingDiagnostics, DiagnosticKind, GlyphAtlas,
    GridSnapshot, LogicalCell,
};

fn encoder_fixture() -> (CellEncoder, GlyphAtlas, SyntheticRasterizer, CollectingDiagnostics) {
    (
        CellEncoder::default(),
        GlyphAtlas::new(256, 1, 1024),
        SyntheticRasterizer::new(10.0, 20.0, 6, 12),
        CollectingDiagnostics::new(),
    )
}

#[test]
fn test_one_record_per_cell_in_row_major_order() {
    let (encoder, mut atlas, mut rasterizer, diagnostics) = encoder_fixture();
    let mut grid = blank_grid(80, 20);
    grid.write_str(0, 0, "A", blank_cell(WHITE, BLACK));
    grid.write_str(79, 19, "Z", blank_cell(WHITE, BLACK));

    let records = encoder.encode(&grid, &mut atlas, &mut rasterizer, &diagnostics);

    assert_eq!(records.len(), 1600);
    let a = atlas.get(GlyphKey::regular('A')).unwrap().index;
    let z = atlas.get(GlyphKey::regular('Z')).unwrap().index;
    assert_eq!(records[0].glyph_index, a);
    assert_eq!(records[1599].glyph_index, z);
    assert!(records[1..1599].iter().all(|r| r.glyph_index == GLYPH_INDEX_NONE));
}

#[test]
fn test_encoding_is_deterministic() {
    let (encoder, mut atlas, mut rasterizer, diagnostics) = encoder_fixture();
    let mut grid = blank_grid(12, 3);
    let styled = blank_cell([0.2, 0.4, 0.6, 1.0], [0.1, 0.1, 0.1, 1.0]).with_attrs(
        CellAttributes {
            bold: true,
            underline: true,
            ..CellAttributes::default()
        },
    );
    grid.write_str(0, 0, "hello, world", styled);
    grid.write_str(2, 2, "grid", blank_cell(WHITE, BLACK));

    let first = encoder.encode(&grid, &mut atlas, &mut rasterizer, &diagnostics);
    let second = encoder.encode(&grid, &mut atlas, &mut rasterizer, &diagnostics);

    assert_eq!(
        bytemuck::cast_slice::<_, u8>(&first),
        bytemuck::cast_slice::<_, u8>(&second)
    );
    assert!(diagnostics.events().is_empty());
}

#[test]
fn test_colors_are_quantized_and_clamped() {
    let (encoder, mut atlas, mut rasterizer, diagnostics) = encoder_fixture();
    let cell = LogicalCell::new('x', [1.5, 0.5, -0.25, 1.0], [0.0, 0.2, 1.0, 0.5]);
    let grid = GridSnapshot::filled(1, 1, cell);

    let records = encoder.encode(&grid, &mut atlas, &mut rasterizer, &diagnostics);

    assert_eq!(records[0].fg, [255, 128, 0, 255]);
    assert_eq!(records[0].bg, [0, 51, 255, 128]);
}

#[test]
fn test_all_attribute_combinations_round_trip() {
    let (encoder, mut atlas, mut rasterizer, diagnostics) = encoder_fixture();

    let cells: Vec<LogicalCell> = (0u16..128)
        .map(|bits| {
            let attrs = CellFlags::from_bits_truncate(bits).attributes();
            LogicalCell::new('m', WHITE, BLACK).with_attrs(attrs)
        })
        .collect();
    let grid = GridSnapshot {
        cols: 16,
        rows: 8,
        cells: cells.clone(),
    };

    let records = encoder.encode(&grid, &mut atlas, &mut rasterizer, &diagnostics);

    for (cell, record) in cells.iter().zip(&records) {
        assert_eq!(record.cell_flags().attributes(), cell.attrs);
        assert_eq!(record.flags & !0x7F, 0, "reserved bits must stay zero");
        assert_eq!(record.padding, [0; 2]);
    }
}

#[test]
fn test_bold_and_italic_select_glyph_variant() {
    let (encoder, mut atlas, mut rasterizer, diagnostics) = encoder_fixture();
    let bold_italic = CellAttributes {
        bold: true,
        italic: true,
        ..CellAttributes::default()
    };
    let grid = GridSnapshot {
        cols: 2,
        rows: 1,
        cells: vec![
            LogicalCell::new('k', WHITE, BLACK),
            LogicalCell::new('k', WHITE, BLACK).with_attrs(bold_italic),
        ],
    };

    let records = encoder.encode(&grid, &mut atlas, &mut rasterizer, &diagnostics);

    assert_ne!(records[0].glyph_index, records[1].glyph_index);
    assert!(atlas.contains(GlyphKey::new('k', GlyphStyle::BoldItalic)));
}

#[test]
fn test_blank_cells_skip_the_rasterizer() {
    let (encoder, mut atlas, mut rasterizer, diagnostics) = encoder_fixture();
    let mut grid = blank_grid(4, 1);
    if let Some(cell) = grid.cell_mut(1, 0) {
        cell.ch = '\0';
    }

    let records = encoder.encode(&grid, &mut atlas, &mut rasterizer, &diagnostics);

    assert!(records.iter().all(|r| !r.has_glyph()));
    assert!(rasterizer.calls.is_empty());
    assert!(atlas.is_empty());
}

#[test]
fn test_missing_glyph_falls_back_and_reports_once() {
    let encoder = CellEncoder::new('?');
    let mut atlas = GlyphAtlas::new(256, 1, 1024);
    let mut rasterizer = SyntheticRasterizer::new(10.0, 20.0, 6, 12).with_missing('\u{2603}');
    let diagnostics = CollectingDiagnostics::new();

    let mut grid = blank_grid(6, 1);
    grid.write_str(0, 0, "\u{2603}a\u{2603}\u{2603}", blank_cell(WHITE, BLACK));

    let records = encoder.encode(&grid, &mut atlas, &mut rasterizer, &diagnostics);

    let fallback = atlas.get(GlyphKey::regular('?')).unwrap().index;
    assert_eq!(records[0].glyph_index, fallback);
    assert_eq!(records[2].glyph_index, fallback);
    assert_eq!(records[3].glyph_index, fallback);
    assert_eq!(diagnostics.count(DiagnosticKind::RasterizationFailure), 1);
    assert_eq!(diagnostics.events().len(), 1);
}

#[test]
fn test_unrenderable_fallback_leaves_cell_blank() {
    let encoder = CellEncoder::new('\u{FFFD}');
    let mut atlas = GlyphAtlas::new(256, 1, 1024);
    let mut rasterizer = SyntheticRasterizer::new(10.0, 20.0, 6, 12)
        .with_missing('\u{2603}')
        .with_missing('\u{FFFD}')
        .with_missing('?');
    let diagnostics = CollectingDiagnostics::new();

    let grid = GridSnapshot::filled(1, 1, LogicalCell::new('\u{2603}', WHITE, BLACK));
    let records = encoder.encode(&grid, &mut atlas, &mut rasterizer, &diagnostics);

    assert_eq!(records[0].glyph_index, GLYPH_INDEX_NONE);
    assert_eq!(records[0].fg, [255, 255, 255, 255], "colors survive a blank glyph");
    assert_eq!(diagnostics.count(DiagnosticKind::RasterizationFailure), 1);
}

#[test]
fn test_exhausted_atlas_blanks_affected_cells() {
    let encoder = CellEncoder::default();
    // Two table slots, three distinct glyphs in one frame
    let mut atlas = GlyphAtlas::new(64, 1, 2);
    let mut rasterizer = SyntheticRasterizer::new(10.0, 20.0, 4, 4);
    let diagnostics = CollectingDiagnostics::new();

    let mut grid = blank_grid(3, 1);
    grid.write_str(0, 0, "abc", blank_cell(WHITE, BLACK));

    let records = encoder.encode(&grid, &mut atlas, &mut rasterizer, &diagnostics);

    assert!(records[0].has_glyph());
    assert!(records[1].has_glyph());
    assert_eq!(records[2].glyph_index, GLYPH_INDEX_NONE);
    assert_eq!(diagnostics.count(DiagnosticKind::AtlasExhausted), 1);
}

#[test]
fn test_glyphs_of_previous_frames_are_reclaimed() {
    let encoder = CellEncoder::default();
    let mut atlas = GlyphAtlas::new(64, 1, 2);
    let mut rasterizer = SyntheticRasterizer::new(10.0, 20.0, 4, 4);
    let diagnostics = CollectingDiagnostics::new();

    let mut first = blank_grid(2, 1);
    first.write_str(0, 0, "ab", blank_cell(WHITE, BLACK));
    encoder.encode(&first, &mut atlas, &mut rasterizer, &diagnostics);

    let mut second = blank_grid(2, 1);
    second.write_str(0, 0, "cd", blank_cell(WHITE, BLACK));
    let records = encoder.encode(&second, &mut atlas, &mut rasterizer, &diagnostics);

    assert!(records.iter().all(|r| r.has_glyph()));
    assert!(diagnostics.events().is_empty());
    assert!(!atlas.contains(GlyphKey::regular('a')));
}
