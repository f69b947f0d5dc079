// Library exports for testing and potential library use
//
// Locking: `parking_lot` for short sync-only critical sections, `arc-swap`
// (inside termgrid-render) for the snapshot handoff between the producer
// task and the render loop. The render loop never blocks on the producer.

/// Application version (root crate version, for use by sub-crates).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod app;
pub mod cli;
pub mod demo;
pub mod logging;
pub mod snapshot;
