//! Graphics pipeline creation
//!
//! This module builds the one pipeline the renderer uses. The shaders are
//! precompiled SPIR-V read from disk (see `shader_builder/`); the triangle's
//! vertices live in the vertex shader, so there is no vertex input at all.

use crate::{
    config::AppConfig,
    error::{Result, TriangleError},
    graphics::{device::Device, render_pass::RenderPass},
};
use ash::vk;
use std::{ffi::CString, io::Cursor, path::Path};

/// Read a SPIR-V binary into 32-bit words.
///
/// Fails if the file cannot be read or its length is not a whole number of
/// words with a valid magic number.
pub fn load_spirv(path: &Path) -> Result<Vec<u32>> {
    let bytes = std::fs::read(path).map_err(|source| TriangleError::ShaderRead {
        path: path.to_path_buf(),
        source,
    })?;

    ash::util::read_spv(&mut Cursor::new(bytes)).map_err(|source| TriangleError::InvalidSpirv {
        path: path.to_path_buf(),
        source,
    })
}

/// Transient shader module; lives only until the pipeline has been built.
struct ShaderModule {
    device: ash::Device,
    handle: vk::ShaderModule,
}

impl ShaderModule {
    fn new(device: &Device, code: &[u32]) -> Result<Self> {
        let handle = unsafe {
            device
                .handle()
                .create_shader_module(&vk::ShaderModuleCreateInfo::default().code(code), None)
        }?;
        Ok(Self {
            device: device.handle().clone(),
            handle,
        })
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.handle, None);
        }
    }
}

/// The graphics pipeline and its (empty) layout.
pub struct Pipeline {
    device: ash::Device,
    handle: vk::Pipeline,
    layout: vk::PipelineLayout,
}

impl Pipeline {
    /// Create the triangle pipeline
    ///
    /// Fixed-function state:
    /// - No vertex bindings or attributes, triangle list topology
    /// - One viewport and scissor covering `extent`
    /// - Filled polygons, back-face culling, clockwise front faces
    /// - One sample, no depth/stencil, blending disabled
    pub fn new(
        device: &Device,
        render_pass: &RenderPass,
        extent: vk::Extent2D,
        config: &AppConfig,
    ) -> Result<Self> {
        let vert_code = load_spirv(&config.vertex_shader)?;
        let frag_code = load_spirv(&config.fragment_shader)?;

        let vert_module = ShaderModule::new(device, &vert_code)?;
        let frag_module = ShaderModule::new(device, &frag_code)?;

        let vert_entry = CString::new(config.vertex_entry.as_str())?;
        let frag_entry = CString::new(config.fragment_entry.as_str())?;

        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vert_module.handle)
                .name(&vert_entry),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(frag_module.handle)
                .name(&frag_entry),
        ];

        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default();

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        let viewports = [vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }];
        let scissors = [vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        }];
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterizer = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::CLOCKWISE)
            .depth_bias_enable(false);

        let multisampling = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1)
            .min_sample_shading(1.0);

        let color_blend_attachments = [vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false)
            .src_color_blend_factor(vk::BlendFactor::ONE)
            .dst_color_blend_factor(vk::BlendFactor::ZERO)
            .color_blend_op(vk::BlendOp::ADD)
            .src_alpha_blend_factor(vk::BlendFactor::ONE)
            .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
            .alpha_blend_op(vk::BlendOp::ADD)];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        // No descriptor sets or push constants
        let layout = unsafe {
            device
                .handle()
                .create_pipeline_layout(&vk::PipelineLayoutCreateInfo::default(), None)
        }?;

        let create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterizer)
            .multisample_state(&multisampling)
            .color_blend_state(&color_blending)
            .layout(layout)
            .render_pass(render_pass.handle())
            .subpass(0);

        let pipelines = unsafe {
            device
                .handle()
                .create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
        };

        let handle = match pipelines {
            Ok(pipelines) => pipelines[0],
            Err((_, err)) => {
                unsafe { device.handle().destroy_pipeline_layout(layout, None) };
                return Err(TriangleError::PipelineCreation(err));
            }
        };

        log::debug!(
            "created graphics pipeline ({}x{} viewport)",
            extent.width,
            extent.height
        );

        // vert_module and frag_module are destroyed here, right after pipeline creation.
        Ok(Self {
            device: device.handle().clone(),
            handle,
            layout,
        })
    }

    pub fn handle(&self) -> vk::Pipeline {
        self.handle
    }

    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.handle, None);
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SPIRV_MAGIC: u32 = 0x0723_0203;

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vert.spv");

        match load_spirv(&path).unwrap_err() {
            TriangleError::ShaderRead { path: reported, source } => {
                assert_eq!(reported, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn read_error_names_the_file() {
        let err = load_spirv(Path::new("../shaders/does-not-exist.spv")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to open file: ../shaders/does-not-exist.spv"
        );
    }

    #[test]
    fn truncated_binary_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&SPIRV_MAGIC.to_ne_bytes()).unwrap();
        file.write_all(&[0x00, 0x01]).unwrap();

        assert!(matches!(
            load_spirv(file.path()),
            Err(TriangleError::InvalidSpirv { .. })
        ));
    }

    #[test]
    fn words_are_loaded_in_order() {
        let words = [SPIRV_MAGIC, 0x0001_0000, 0, 1, 0];
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for word in words {
            file.write_all(&word.to_ne_bytes()).unwrap();
        }

        assert_eq!(load_spirv(file.path()).unwrap(), words.to_vec());
    }
}
