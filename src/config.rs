//! Application configuration
//!
//! Everything here is fixed at startup. There are no command-line flags and
//! no config file; the validation switch is the `validation` Cargo feature.
//!
//! The default shader paths are relative to the working directory and point
//! at `<crate>/shaders/`, where `shader_builder` writes the SPIR-V. Run the
//! binary from a directory one level below the crate root, e.g.
//! `cd target && cargo run`, or override them with
//! [`AppConfig::with_shaders`].

use std::ffi::CString;
use std::path::PathBuf;

/// Settings for the window, the Vulkan instance and the triangle pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub window_title: String,
    /// Requested window size in physical pixels; also the swapchain extent
    /// whenever the surface leaves the extent to the application.
    pub width: u32,
    pub height: u32,
    pub application_name: String,
    pub engine_name: String,
    /// SPIR-V binaries, resolved against the current working directory.
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub enable_validation: bool,
    pub validation_layers: Vec<CString>,
    /// Stop after this many presented frames. `None` runs until the window is closed.
    pub frame_limit: Option<u64>,
    /// Create the window hidden (used by smoke tests).
    pub visible: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_title: "Vulkan".to_string(),
            width: 800,
            height: 600,
            application_name: "Hello Triangle".to_string(),
            engine_name: "No Engine".to_string(),
            vertex_shader: PathBuf::from("../shaders/vert.spv"),
            fragment_shader: PathBuf::from("../shaders/frag.spv"),
            vertex_entry: "main_vs".to_string(),
            fragment_entry: "main_fs".to_string(),
            enable_validation: cfg!(feature = "validation"),
            validation_layers: Vec::new(),
            frame_limit: None,
            visible: true,
        }
    }
}

impl AppConfig {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_shaders(mut self, vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        self.vertex_shader = vertex.into();
        self.fragment_shader = fragment.into();
        self
    }

    pub fn with_entry_points(mut self, vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        self.vertex_entry = vertex.into();
        self.fragment_entry = fragment.into();
        self
    }

    pub fn with_validation(mut self, enabled: bool, layers: Vec<CString>) -> Self {
        self.enable_validation = enabled;
        self.validation_layers = layers;
        self
    }

    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Layers to enable on the instance: the configured list when validation
    /// is on, nothing otherwise.
    pub fn active_layers(&self) -> &[CString] {
        if self.enable_validation {
            &self.validation_layers
        } else {
            &[]
        }
    }
}
