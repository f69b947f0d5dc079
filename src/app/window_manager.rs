//! Owner of the single termgrid window.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use termgrid_config::Config;
use tokio::runtime::Runtime;

use crate::app::WindowState;
use crate::cli::RuntimeOptions;

pub struct WindowManager {
    pub(crate) config: Config,
    pub(crate) runtime: Arc<Runtime>,
    pub(crate) runtime_options: RuntimeOptions,
    pub(crate) window: Option<WindowState>,
    pub(crate) started: Instant,
    /// First fatal error; ends the event loop
    pub(crate) fatal: Option<anyhow::Error>,
}

impl WindowManager {
    pub fn new(config: Config, runtime: Arc<Runtime>, runtime_options: RuntimeOptions) -> Self {
        Self {
            config,
            runtime,
            runtime_options,
            window: None,
            started: Instant::now(),
            fatal: None,
        }
    }

    /// Whether `--exit-after` has run out.
    pub(crate) fn exit_due(&self) -> bool {
        self.runtime_options
            .exit_after
            .is_some_and(|secs| self.started.elapsed().as_secs_f64() >= secs)
    }

    /// Close the window; the demo producer stops with it.
    pub(crate) fn close_window(&mut self) {
        if let Some(state) = self.window.take() {
            log::info!(
                "Closing window: {} frames presented, {} dropped",
                state.renderer.frames_presented(),
                state.renderer.frames_dropped()
            );
        }
    }

    /// Outcome of the event loop: the fatal error, if one ended it.
    pub fn into_result(self) -> Result<()> {
        match self.fatal {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
