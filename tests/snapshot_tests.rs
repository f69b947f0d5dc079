//! Headless snapshot rendering and config loading.

mod common;

use std::fs;

use common::{BlockRasterizer, rgba};
use termgrid::app::load_config;
use termgrid::snapshot::render_demo;
use termgrid_config::Config;
use tempfile::TempDir;

#[test]
fn test_snapshot_image_covers_the_grid() {
    let config = Config::default();
    let image = render_demo(&config, Box::new(BlockRasterizer::new(8.0, 16.0)), 20, 6, 0.0)
        .expect("demo renders");

    assert_eq!(image.dimensions(), (160, 96));
}

#[test]
fn test_snapshot_header_is_inverse() {
    let config = Config::default();
    let image = render_demo(&config, Box::new(BlockRasterizer::new(8.0, 16.0)), 20, 6, 0.0)
        .expect("demo renders");

    // Header cells are blank and inverse: the foreground becomes the background
    assert_eq!(image.get_pixel(0, 0).0, rgba(config.foreground));
    // Row 1 is an empty plain row
    assert_eq!(image.get_pixel(4, 24).0, rgba(config.background));
}

#[test]
fn test_snapshot_draws_cursor() {
    let mut config = Config::default();
    config.cursor_color = [255, 0, 0];
    let image = render_demo(&config, Box::new(BlockRasterizer::new(8.0, 16.0)), 20, 6, 0.0)
        .expect("demo renders");

    // Prompt on the last row, cursor right after "$ "
    let (x, y) = (2 * 8 + 4, 5 * 16 + 8);
    assert_eq!(image.get_pixel(x, y).0, [255, 0, 0, 255]);
}

#[test]
fn test_load_config_from_explicit_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("termgrid.yaml");
    fs::write(&path, "cols: 100\nrows: 30\nwindow_title: grid\n").unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert_eq!((config.cols, config.rows), (100, 30));
    assert_eq!(config.window_title, "grid");
    assert_eq!(config.atlas_size, Config::default().atlas_size);
}

#[test]
fn test_load_config_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = load_config(Some(&dir.path().join("absent.yaml"))).unwrap_err();
    assert!(format!("{err:#}").contains("absent.yaml"));
}
