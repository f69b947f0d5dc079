//! File-backed bridge for the `log` facade.
//!
//! Every `log::info!()` etc. from termgrid and its sub-crates goes to
//! `termgrid_debug.log` in the system temp directory, so output never lands
//! on the terminal the renderer draws for. When `RUST_LOG` is set, records
//! are mirrored to stderr as well.
//!
//! Level precedence: CLI `--log-level`, then `RUST_LOG`, then the config
//! file (applied with [`apply_config_level`] once the config is loaded).

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use termgrid_config::LogLevel;

const LOG_FILE_NAME: &str = "termgrid_debug.log";

struct LogBridge {
    file: Mutex<Option<File>>,
    mirror_stderr: bool,
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{}] [{:<5}] [{}] {}\n",
            timestamp(),
            record.level(),
            record.target(),
            record.args()
        );

        let mut file = self.file.lock();
        if file.is_none() {
            *file = open_log_file();
        }
        if let Some(f) = file.as_mut() {
            let _ = f.write_all(line.as_bytes());
        }
        drop(file);

        if self.mirror_stderr {
            eprint!("{line}");
        }
    }

    fn flush(&self) {
        if let Some(f) = self.file.lock().as_mut() {
            let _ = f.flush();
        }
    }
}

static BRIDGE: OnceLock<LogBridge> = OnceLock::new();

/// Set when the level came from the CLI or `RUST_LOG`; the config may not override it.
static LEVEL_PINNED: AtomicBool = AtomicBool::new(false);

/// Path of the debug log file.
pub fn log_path() -> PathBuf {
    std::env::temp_dir().join(LOG_FILE_NAME)
}

fn open_log_file() -> Option<File> {
    let mut file = OpenOptions::new()
        .write(true)
        .truncate(true)
        .create(true)
        .open(log_path())
        .ok()?;
    let _ = writeln!(
        file,
        "{}\ntermgrid {} debug session started at {}\n{}",
        "=".repeat(80),
        env!("CARGO_PKG_VERSION"),
        timestamp(),
        "=".repeat(80)
    );
    Some(file)
}

fn timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Level from `RUST_LOG`, when it names a plain level (`debug`, `warn`, ...).
fn rust_log_level() -> Option<LevelFilter> {
    let value = std::env::var("RUST_LOG").ok()?;
    LevelFilter::from_str(value.trim()).ok()
}

/// Install the bridge as the global logger.
///
/// `cli_level` wins over `RUST_LOG`. Without either, logging stays off until
/// [`apply_config_level`] runs. Calling this twice is harmless.
pub fn init_log_bridge(cli_level: Option<LevelFilter>) {
    let mirror_stderr = std::env::var_os("RUST_LOG").is_some();
    let bridge = BRIDGE.get_or_init(|| LogBridge {
        file: Mutex::new(None),
        mirror_stderr,
    });
    if log::set_logger(bridge).is_err() {
        return;
    }

    let pinned = cli_level.or_else(rust_log_level);
    LEVEL_PINNED.store(pinned.is_some(), Ordering::Release);
    log::set_max_level(pinned.unwrap_or(LevelFilter::Off));
}

/// Apply the config file's level unless the CLI or `RUST_LOG` already chose one.
pub fn apply_config_level(level: LogLevel) {
    if LEVEL_PINNED.load(Ordering::Acquire) {
        return;
    }
    log::set_max_level(level.to_level_filter());
    if level != LogLevel::Off {
        log::info!("Log level {} (from config)", level.display_name());
    }
}
