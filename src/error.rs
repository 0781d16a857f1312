//! Error types for the library

use ash::vk;
use std::path::PathBuf;
use thiserror::Error;

/// Error types for the hello-triangle renderer
#[derive(Error, Debug)]
pub enum TriangleError {
    #[error("Failed to load the Vulkan library: {0}")]
    VulkanLoading(#[from] ash::LoadingError),

    #[error("Failed to create Vulkan instance: {0}")]
    InstanceCreation(vk::Result),

    #[error("Failed to create window surface: {0}")]
    SurfaceCreation(vk::Result),

    #[error("Failed to create logical device: {0}")]
    DeviceCreation(vk::Result),

    #[error("Failed to create graphics pipeline: {0}")]
    PipelineCreation(vk::Result),

    #[error("Vulkan error: {0}")]
    Vulkan(#[from] vk::Result),

    #[error("Failed to open file: {}", path.display())]
    ShaderRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a valid SPIR-V binary", path.display())]
    InvalidSpirv {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Name contains an interior NUL byte: {0}")]
    InvalidName(#[from] std::ffi::NulError),

    #[error("winit EventLoopError: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("Failed to create window: {0}")]
    WindowCreation(#[from] winit::error::OsError),

    #[error("Window handle unavailable: {0}")]
    WindowHandle(#[from] raw_window_handle::HandleError),

    #[error("Graphics error: {0}")]
    Graphics(#[from] crate::graphics::error::GraphicsError),
}

/// Convenience type alias for Results with [`TriangleError`]
pub type Result<T> = std::result::Result<T, TriangleError>;
