//! Default value functions referenced by `#[serde(default = "...")]`.

use crate::types::{CursorStyle, LogLevel, PowerPreference, VsyncMode};

// Font
pub fn font_family() -> Option<String> {
    None
}

pub fn font_size() -> f32 {
    13.0
}

pub fn line_spacing() -> f32 {
    1.0 // Line height multiplier
}

pub fn char_spacing() -> f32 {
    1.0 // Character width multiplier
}

pub fn bool_true() -> bool {
    true
}

pub fn bool_false() -> bool {
    false
}

pub fn fallback_glyph() -> char {
    '\u{FFFD}'
}

// Atlas
pub fn atlas_size() -> u32 {
    2048
}

pub fn atlas_glyph_padding() -> u32 {
    2
}

pub fn max_glyphs() -> u32 {
    4096
}

// Blink
pub fn text_blink_period() -> f64 {
    1.0 // Seconds per full on/off cycle
}

pub fn cursor_blink_period() -> f64 {
    1.0
}

pub fn cursor_style() -> CursorStyle {
    CursorStyle::Block
}

pub fn cursor_color() -> [u8; 3] {
    [220, 220, 220]
}

// Colors
pub fn foreground() -> [u8; 3] {
    [204, 204, 204]
}

pub fn background() -> [u8; 3] {
    [30, 30, 30]
}

// Shading
pub fn dim_factor() -> f32 {
    0.5
}

pub fn underline_position() -> f32 {
    0.9 // Fraction of cell height from the top
}

pub fn underline_thickness() -> f32 {
    1.0 // Pixels
}

pub fn strikethrough_position() -> f32 {
    0.55
}

// GPU
pub fn vsync_mode() -> VsyncMode {
    VsyncMode::Fifo
}

pub fn power_preference() -> PowerPreference {
    PowerPreference::None
}

pub fn frames_in_flight() -> u32 {
    3
}

pub fn frame_acquire_timeout_ms() -> u64 {
    100
}

// Window
pub fn window_title() -> String {
    "termgrid".to_string()
}

pub fn cols() -> usize {
    80
}

pub fn rows() -> usize {
    24
}

pub fn log_level() -> LogLevel {
    LogLevel::Off
}
