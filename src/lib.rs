//! Hello Triangle
//!
//! Opens a window and draws one hard-coded triangle with Vulkan (via ash)
//! until the window is closed.

pub mod app;
pub mod config;
pub mod error;
pub mod graphics;
pub mod logging;

pub use app::{run, run_with_event_loop, RunSummary};
pub use config::AppConfig;
pub use error::{Result, TriangleError};
