//! Typed error variants for the termgrid-config crate.
//!
//! Callers that work with `anyhow` get these coerced automatically; callers
//! that care about the failure mode can match on [`ConfigError`] directly.

/// Errors that can occur when loading or saving configuration.
///
/// # Example
///
/// ```rust,no_run
/// use termgrid_config::{Config, ConfigError};
///
/// match Config::load() {
///     Ok(config) => println!("font size {}", config.font_size),
///     Err(ConfigError::Parse(p)) => eprintln!("YAML parse error: {p}"),
///     Err(e) => eprintln!("config unavailable: {e}"),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred reading or writing the config file.
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file contained invalid YAML that could not be parsed.
    #[error("YAML parse error in config: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    /// A field value failed semantic validation and could not be clamped.
    ///
    /// The inner string describes which field is invalid and why.
    #[error("Config validation error: {0}")]
    Validation(String),

    /// No platform configuration directory could be determined.
    #[error("Could not determine a platform configuration directory")]
    NoConfigDir,
}
