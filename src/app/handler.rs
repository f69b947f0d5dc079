//! `ApplicationHandler` impl for `WindowManager`.

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::window::WindowId;

use crate::app::{WindowManager, WindowState};

impl ApplicationHandler for WindowManager {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        match WindowState::new(event_loop, &self.config, &self.runtime) {
            Ok(state) => self.window = Some(state),
            Err(e) => {
                log::error!("Failed to create window: {:#}", e);
                self.fatal = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.window.as_mut() else {
            return;
        };
        if state.window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                self.close_window();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                state.handle_resize(size.width, size.height);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                state.handle_scale_factor_change(scale_factor);
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                state.handle_key_press();
            }
            WindowEvent::RedrawRequested => {
                state.render();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_due() {
            log::info!("--exit-after elapsed, exiting");
            self.close_window();
            event_loop.exit();
            return;
        }
        // Blink phases and demo updates need continuous frames
        if let Some(state) = &self.window {
            state.window.request_redraw();
        }
    }
}
