//! Configuration system for the termgrid cell-grid renderer.
//!
//! Provides the [`Config`] struct loaded from `config.yaml`, the default
//! value functions used by serde, and the small enum types shared with the
//! render crate (vsync, power preference, cursor style, log level).

pub mod config;
pub mod defaults;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::ConfigError;
pub use types::{CursorStyle, LogLevel, PowerPreference, VsyncMode, color_u8_to_f32};
