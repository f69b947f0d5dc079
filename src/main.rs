// Hide console window on Windows release builds
#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

use std::sync::Arc;

use anyhow::Result;
use termgrid::app::App;
use termgrid::cli;
use tokio::runtime::Runtime;

fn main() -> Result<()> {
    // Process CLI arguments first (before logging init for cleaner output)
    let runtime_options = match cli::process_cli() {
        cli::CliResult::Exit(code) => {
            if code == 0 {
                return Ok(());
            }
            std::process::exit(code);
        }
        cli::CliResult::Continue(options) => options,
    };
    // Routes all log::info!() etc. to termgrid_debug.log in the temp dir.
    // CLI --log-level takes precedence, then RUST_LOG, then config (applied later).
    termgrid::logging::init_log_bridge(runtime_options.log_level);

    log::info!("Starting termgrid {}", termgrid::VERSION);

    // Tokio runtime for GPU init and the demo producer
    let runtime = Arc::new(Runtime::new()?);

    let result = App::new(Arc::clone(&runtime), runtime_options).and_then(App::run);

    // Give background tasks a bounded time to wind down
    log::info!("Event loop exited, shutting down runtime");
    if let Ok(rt) = Arc::try_unwrap(runtime) {
        rt.shutdown_timeout(std::time::Duration::from_secs(2));
    }

    match result {
        Ok(()) => Ok(()),
        Err(ref e) => {
            eprintln!("termgrid: error: {e:#}");
            #[cfg(target_os = "linux")]
            {
                let msg = format!("{e:?}").to_lowercase();
                if msg.contains("display")
                    || msg.contains("wayland")
                    || msg.contains("xcb")
                    || msg.contains("x server")
                    || msg.contains("compositor")
                {
                    eprintln!(
                        "termgrid: hint: no display server found, ensure DISPLAY (X11) or \
                         WAYLAND_DISPLAY (Wayland) is set, or use `termgrid snapshot` to \
                         render without a window"
                    );
                }
            }
            result
        }
    }
}
