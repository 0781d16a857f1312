//! Command pool and the pre-recorded draw command buffers
//!
//! Each buffer is recorded exactly once, at creation, and resubmitted every
//! time its framebuffer's image is acquired. There is no API to re-record.

use crate::{
    error::Result,
    graphics::{
        device::Device, error::GraphicsError, framebuffer::Framebuffers, pipeline::Pipeline,
        render_pass::RenderPass,
    },
};
use ash::vk;

/// Clear color behind the triangle.
pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Vertices per draw; positions and colors are generated in the vertex shader.
pub const TRIANGLE_VERTEX_COUNT: u32 = 3;

pub struct DrawCommands {
    device: ash::Device,
    pool: vk::CommandPool,
    buffers: Vec<vk::CommandBuffer>,
}

impl DrawCommands {
    /// Allocate one primary buffer per framebuffer and record the triangle
    /// draw into each of them.
    pub fn record(
        device: &Device,
        render_pass: &RenderPass,
        pipeline: &Pipeline,
        framebuffers: &Framebuffers,
        extent: vk::Extent2D,
    ) -> Result<Self> {
        let pool = unsafe {
            device.handle().create_command_pool(
                &vk::CommandPoolCreateInfo::default()
                    .queue_family_index(device.queue_families().graphics),
                None,
            )
        }?;

        // From here on the pool (and everything allocated from it) is released on error.
        let mut commands = Self {
            device: device.handle().clone(),
            pool,
            buffers: Vec::new(),
        };

        commands.buffers = unsafe {
            commands.device.allocate_command_buffers(
                &vk::CommandBufferAllocateInfo::default()
                    .command_pool(pool)
                    .level(vk::CommandBufferLevel::PRIMARY)
                    .command_buffer_count(framebuffers.len() as u32),
            )
        }?;

        let clear_values = [vk::ClearValue {
            color: vk::ClearColorValue {
                float32: CLEAR_COLOR,
            },
        }];
        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };

        for (&command_buffer, &framebuffer) in commands.buffers.iter().zip(framebuffers.handles()) {
            unsafe {
                // Without a per-frame fence a buffer may still be pending when resubmitted.
                commands.device.begin_command_buffer(
                    command_buffer,
                    &vk::CommandBufferBeginInfo::default()
                        .flags(vk::CommandBufferUsageFlags::SIMULTANEOUS_USE),
                )?;

                commands.device.cmd_begin_render_pass(
                    command_buffer,
                    &vk::RenderPassBeginInfo::default()
                        .render_pass(render_pass.handle())
                        .framebuffer(framebuffer)
                        .render_area(render_area)
                        .clear_values(&clear_values),
                    vk::SubpassContents::INLINE,
                );
                commands.device.cmd_bind_pipeline(
                    command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    pipeline.handle(),
                );
                commands
                    .device
                    .cmd_draw(command_buffer, TRIANGLE_VERTEX_COUNT, 1, 0, 0);
                commands.device.cmd_end_render_pass(command_buffer);

                commands.device.end_command_buffer(command_buffer)?;
            }
        }

        log::debug!("recorded {} draw command buffers", commands.buffers.len());
        Ok(commands)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// The buffer recorded against the framebuffer of swapchain image `image_index`.
    pub fn for_image(&self, image_index: u32) -> Result<vk::CommandBuffer> {
        self.buffers
            .get(image_index as usize)
            .copied()
            .ok_or_else(|| {
                GraphicsError::ImageIndexOutOfRange {
                    index: image_index,
                    count: self.buffers.len(),
                }
                .into()
            })
    }
}

impl Drop for DrawCommands {
    fn drop(&mut self) {
        // Destroying the pool frees its command buffers.
        unsafe {
            self.device.destroy_command_pool(self.pool, None);
        }
    }
}
