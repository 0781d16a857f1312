//! Vulkan rendering of a single hard-coded triangle
//!
//! Objects are created in this order, each one owned by the next layer up:
//! - Instance and window surface
//! - Physical device selection, logical device and queues
//! - Swapchain with one image view per image
//! - Render pass and the fixed graphics pipeline
//! - Framebuffers and pre-recorded command buffers
//! - Semaphores for the acquire → submit → present protocol
//!
//! [`GraphicsContext`] ties them together and owns their teardown.

pub mod commands;
pub mod context;
pub mod device;
pub mod error;
pub mod frame;
pub mod framebuffer;
pub mod instance;
pub mod pipeline;
pub mod render_pass;
pub mod surface;
pub mod swapchain;
pub mod sync;

pub use context::GraphicsContext;
