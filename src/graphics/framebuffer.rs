//! Framebuffers binding each swapchain image view to the render pass

use crate::{error::Result, graphics::{device::Device, render_pass::RenderPass}};
use ash::vk;

/// One framebuffer per image view, in swapchain image order.
pub struct Framebuffers {
    device: ash::Device,
    framebuffers: Vec<vk::Framebuffer>,
}

impl Framebuffers {
    pub fn new(
        device: &Device,
        render_pass: &RenderPass,
        image_views: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> Result<Self> {
        let mut framebuffers = Self {
            device: device.handle().clone(),
            framebuffers: Vec::with_capacity(image_views.len()),
        };

        for &view in image_views {
            let attachments = [view];
            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass.handle())
                .attachments(&attachments)
                .width(extent.width)
                .height(extent.height)
                .layers(1);
            let framebuffer = unsafe { framebuffers.device.create_framebuffer(&create_info, None) }?;
            framebuffers.framebuffers.push(framebuffer);
        }

        log::debug!("created {} framebuffers", framebuffers.len());
        Ok(framebuffers)
    }

    pub fn handles(&self) -> &[vk::Framebuffer] {
        &self.framebuffers
    }

    pub fn len(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.framebuffers.is_empty()
    }
}

impl Drop for Framebuffers {
    fn drop(&mut self) {
        unsafe {
            for &framebuffer in &self.framebuffers {
                self.device.destroy_framebuffer(framebuffer, None);
            }
        }
    }
}
