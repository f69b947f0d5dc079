//! Application module for termgrid
//!
//! - `App`: loads the config and runs the winit event loop
//! - `WindowManager`: the `ApplicationHandler`, owns the window once resumed
//! - `WindowState`: window, GPU renderer, frame pipeline and demo producer

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use termgrid_config::Config;
use tokio::runtime::Runtime;
use winit::event_loop::{ControlFlow, EventLoop};

use crate::cli::RuntimeOptions;

mod handler;
pub mod window_manager;
pub mod window_state;

pub use window_manager::WindowManager;
pub use window_state::WindowState;

/// Load the config from `path`, or from the default location when `None`.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Config::load().context("Failed to load config"),
    }
}

/// Main application entry point
pub struct App {
    config: Config,
    runtime: Arc<Runtime>,
    runtime_options: RuntimeOptions,
}

impl App {
    /// Create a new application
    pub fn new(runtime: Arc<Runtime>, runtime_options: RuntimeOptions) -> Result<Self> {
        let config = load_config(runtime_options.config_path.as_deref())?;
        crate::logging::apply_config_level(config.log_level);

        Ok(Self {
            config,
            runtime,
            runtime_options,
        })
    }

    /// Run the application
    pub fn run(self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let mut window_manager =
            WindowManager::new(self.config, self.runtime, self.runtime_options);

        event_loop.run_app(&mut window_manager)?;

        window_manager.into_result()
    }
}
