//! The [`Config`] struct and its persistence.
//!
//! Every field carries a `#[serde(default = "...")]` so partial YAML files
//! load cleanly and new fields never break existing configs.

use crate::defaults;
use crate::error::ConfigError;
use crate::types::{CursorStyle, LogLevel, PowerPreference, VsyncMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Largest number of atlas table slots; `0xFFFF` is reserved as the
/// "no glyph" sentinel in cell records.
pub const MAX_GLYPH_TABLE: u32 = 0xFFFF;

/// Upper bound for frames in flight.
pub const MAX_FRAMES_IN_FLIGHT: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // ========================================================================
    // Font
    // ========================================================================
    /// Primary font family; `None` picks a monospace system font
    #[serde(default = "defaults::font_family")]
    pub font_family: Option<String>,

    /// Bold font family (falls back to the primary family with bold weight)
    #[serde(default)]
    pub font_family_bold: Option<String>,

    /// Italic font family (falls back to the primary family with italic style)
    #[serde(default)]
    pub font_family_italic: Option<String>,

    /// Bold-italic font family
    #[serde(default)]
    pub font_family_bold_italic: Option<String>,

    /// Font size in points
    #[serde(default = "defaults::font_size")]
    pub font_size: f32,

    /// Line height multiplier
    #[serde(default = "defaults::line_spacing")]
    pub line_spacing: f32,

    /// Character width multiplier
    #[serde(default = "defaults::char_spacing")]
    pub char_spacing: f32,

    /// Antialiased glyph edges
    #[serde(default = "defaults::bool_true")]
    pub font_antialias: bool,

    /// Hinted glyph outlines
    #[serde(default = "defaults::bool_true")]
    pub font_hinting: bool,

    /// Render subpixel masks collapsed to luminance for lighter strokes
    #[serde(default = "defaults::bool_false")]
    pub font_thin_strokes: bool,

    /// Glyph substituted when rasterization fails
    #[serde(default = "defaults::fallback_glyph")]
    pub fallback_glyph: char,

    // ========================================================================
    // Glyph atlas
    // ========================================================================
    /// Atlas texture edge length in pixels (clamped to the device limit)
    #[serde(default = "defaults::atlas_size")]
    pub atlas_size: u32,

    /// Padding in pixels reserved right of and below every glyph
    #[serde(default = "defaults::atlas_glyph_padding")]
    pub atlas_glyph_padding: u32,

    /// Capacity of the glyph entry table
    #[serde(default = "defaults::max_glyphs")]
    pub max_glyphs: u32,

    // ========================================================================
    // Blink and cursor
    // ========================================================================
    /// Full text blink cycle in seconds; zero or negative disables blinking
    #[serde(default = "defaults::text_blink_period")]
    pub text_blink_period: f64,

    #[serde(default = "defaults::bool_true")]
    pub cursor_blink: bool,

    /// Full cursor blink cycle in seconds
    #[serde(default = "defaults::cursor_blink_period")]
    pub cursor_blink_period: f64,

    #[serde(default = "defaults::cursor_style")]
    pub cursor_style: CursorStyle,

    #[serde(default = "defaults::cursor_color")]
    pub cursor_color: [u8; 3],

    // ========================================================================
    // Colors
    // ========================================================================
    #[serde(default = "defaults::foreground")]
    pub foreground: [u8; 3],

    #[serde(default = "defaults::background")]
    pub background: [u8; 3],

    // ========================================================================
    // Shading
    // ========================================================================
    /// Foreground multiplier for dim cells (0.0 - 1.0)
    #[serde(default = "defaults::dim_factor")]
    pub dim_factor: f32,

    /// Underline band position as a fraction of cell height
    #[serde(default = "defaults::underline_position")]
    pub underline_position: f32,

    /// Underline and strikethrough band thickness in pixels
    #[serde(default = "defaults::underline_thickness")]
    pub underline_thickness: f32,

    /// Strikethrough band position as a fraction of cell height
    #[serde(default = "defaults::strikethrough_position")]
    pub strikethrough_position: f32,

    // ========================================================================
    // GPU
    // ========================================================================
    #[serde(default = "defaults::vsync_mode")]
    pub vsync_mode: VsyncMode,

    #[serde(default = "defaults::power_preference")]
    pub power_preference: PowerPreference,

    /// Number of multi-buffered frame slots (1 - 4)
    #[serde(default = "defaults::frames_in_flight")]
    pub frames_in_flight: u32,

    /// Longest wait for a free frame slot before the frame is dropped
    #[serde(default = "defaults::frame_acquire_timeout_ms")]
    pub frame_acquire_timeout_ms: u64,

    // ========================================================================
    // Window
    // ========================================================================
    #[serde(default = "defaults::window_title")]
    pub window_title: String,

    /// Initial window width in cells
    #[serde(default = "defaults::cols")]
    pub cols: usize,

    /// Initial window height in cells
    #[serde(default = "defaults::rows")]
    pub rows: usize,

    #[serde(default = "defaults::log_level")]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            font_family: defaults::font_family(),
            font_family_bold: None,
            font_family_italic: None,
            font_family_bold_italic: None,
            font_size: defaults::font_size(),
            line_spacing: defaults::line_spacing(),
            char_spacing: defaults::char_spacing(),
            font_antialias: defaults::bool_true(),
            font_hinting: defaults::bool_true(),
            font_thin_strokes: defaults::bool_false(),
            fallback_glyph: defaults::fallback_glyph(),
            atlas_size: defaults::atlas_size(),
            atlas_glyph_padding: defaults::atlas_glyph_padding(),
            max_glyphs: defaults::max_glyphs(),
            text_blink_period: defaults::text_blink_period(),
            cursor_blink: defaults::bool_true(),
            cursor_blink_period: defaults::cursor_blink_period(),
            cursor_style: defaults::cursor_style(),
            cursor_color: defaults::cursor_color(),
            foreground: defaults::foreground(),
            background: defaults::background(),
            dim_factor: defaults::dim_factor(),
            underline_position: defaults::underline_position(),
            underline_thickness: defaults::underline_thickness(),
            strikethrough_position: defaults::strikethrough_position(),
            vsync_mode: defaults::vsync_mode(),
            power_preference: defaults::power_preference(),
            frames_in_flight: defaults::frames_in_flight(),
            frame_acquire_timeout_ms: defaults::frame_acquire_timeout_ms(),
            window_title: defaults::window_title(),
            cols: defaults::cols(),
            rows: defaults::rows(),
            log_level: defaults::log_level(),
        }
    }
}

impl Config {
    /// Load configuration from the default path, creating it with defaults
    /// when no file exists yet.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;
        log::info!("Config path: {:?}", config_path);

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            log::info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            if let Err(e) = config.save_to(&config_path) {
                log::error!("Failed to save default config: {}", e);
                return Err(e);
            }
            Ok(config)
        }
    }

    /// Load and validate configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        log::info!("Loading config from {:?}", path);
        let contents = fs::read_to_string(path)?;
        let mut config: Config = serde_yaml_ng::from_str(&contents)?;
        for warning in config.validate()? {
            log::warn!("Config: {}", warning);
        }
        Ok(config)
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml_ng::to_string(self)?;

        // Atomic save: write to temp file then rename to prevent corruption on crash
        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, &yaml)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Get the configuration file path: `<config dir>/termgrid/config.yaml`.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("termgrid").join("config.yaml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Clamp out-of-range values in place.
    ///
    /// Returns one human-readable warning per adjusted field. Values that
    /// cannot be repaired by clamping produce [`ConfigError::Validation`].
    pub fn validate(&mut self) -> Result<Vec<String>, ConfigError> {
        let mut warnings = Vec::new();

        if self.fallback_glyph == ' ' || self.fallback_glyph == '\0' {
            return Err(ConfigError::Validation(format!(
                "fallback_glyph must be a visible character, got {:?}",
                self.fallback_glyph
            )));
        }

        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            warnings.push(format!(
                "font_size {} is not positive, using {}",
                self.font_size,
                defaults::font_size()
            ));
            self.font_size = defaults::font_size();
        }

        clamp_f32(&mut self.line_spacing, 0.5, 3.0, "line_spacing", &mut warnings);
        clamp_f32(&mut self.char_spacing, 0.5, 3.0, "char_spacing", &mut warnings);
        clamp_f32(&mut self.dim_factor, 0.0, 1.0, "dim_factor", &mut warnings);
        clamp_f32(
            &mut self.underline_position,
            0.0,
            1.0,
            "underline_position",
            &mut warnings,
        );
        clamp_f32(
            &mut self.strikethrough_position,
            0.0,
            1.0,
            "strikethrough_position",
            &mut warnings,
        );
        clamp_f32(
            &mut self.underline_thickness,
            0.5,
            8.0,
            "underline_thickness",
            &mut warnings,
        );

        clamp_u32(&mut self.atlas_size, 64, 16384, "atlas_size", &mut warnings);
        clamp_u32(
            &mut self.atlas_glyph_padding,
            0,
            16,
            "atlas_glyph_padding",
            &mut warnings,
        );
        clamp_u32(
            &mut self.max_glyphs,
            1,
            MAX_GLYPH_TABLE,
            "max_glyphs",
            &mut warnings,
        );
        clamp_u32(
            &mut self.frames_in_flight,
            1,
            MAX_FRAMES_IN_FLIGHT,
            "frames_in_flight",
            &mut warnings,
        );

        if self.cols == 0 || self.rows == 0 {
            warnings.push(format!(
                "grid {}x{} is empty, using {}x{}",
                self.cols,
                self.rows,
                defaults::cols(),
                defaults::rows()
            ));
            self.cols = defaults::cols();
            self.rows = defaults::rows();
        }

        Ok(warnings)
    }
}

fn clamp_f32(value: &mut f32, min: f32, max: f32, name: &str, warnings: &mut Vec<String>) {
    let clamped = if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    };
    if clamped != *value {
        warnings.push(format!("{name} {} out of range, clamped to {clamped}", *value));
        *value = clamped;
    }
}

fn clamp_u32(value: &mut u32, min: u32, max: u32, name: &str, warnings: &mut Vec<String>) {
    let clamped = (*value).clamp(min, max);
    if clamped != *value {
        warnings.push(format!("{name} {} out of range, clamped to {clamped}", *value));
        *value = clamped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate_cleanly() {
        let mut config = Config::default();
        let warnings = config.validate().unwrap();
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    }

    #[test]
    fn test_nan_clamps_to_minimum() {
        let mut config = Config {
            dim_factor: f32::NAN,
            ..Config::default()
        };
        let warnings = config.validate().unwrap();
        assert_eq!(config.dim_factor, 0.0);
        assert_eq!(warnings.len(), 1);
    }
}
