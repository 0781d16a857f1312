use thiserror::Error;

use super::frame::FramePhase;

/// Failures of the setup sequence and frame protocol that are not plain Vulkan result codes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    #[error("Failed to find GPU with Vulkan support")]
    NoPhysicalDevices,

    #[error("Failed to find compatible device among {0} devices")]
    NoSuitableDevice(usize),

    #[error("Validation layers requested but not supported: {0}")]
    UnsupportedValidationLayer(String),

    #[error("Selected device has no {0} queue family")]
    MissingQueueFamily(&'static str),

    #[error("Swapchain image index {index} has no command buffer ({count} recorded)")]
    ImageIndexOutOfRange { index: u32, count: usize },

    #[error("Invalid frame transition from {from:?} to {to:?}")]
    InvalidFrameTransition { from: FramePhase, to: FramePhase },
}
