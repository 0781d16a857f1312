//! Binary semaphores ordering acquire → render → present on the GPU
//!
//! There is deliberately no fence: the host never waits on a frame, only on
//! device idle at shutdown.

use crate::{error::Result, graphics::device::Device};
use ash::vk;

pub struct FrameSemaphores {
    device: ash::Device,
    /// Signalled by image acquisition, waited on by the draw submission.
    pub image_available: vk::Semaphore,
    /// Signalled by the draw submission, waited on by presentation.
    pub render_completed: vk::Semaphore,
}

impl FrameSemaphores {
    pub fn new(device: &Device) -> Result<Self> {
        let device = device.handle().clone();
        let create_info = vk::SemaphoreCreateInfo::default();

        let image_available = unsafe { device.create_semaphore(&create_info, None) }?;
        let render_completed = match unsafe { device.create_semaphore(&create_info, None) } {
            Ok(semaphore) => semaphore,
            Err(err) => {
                unsafe { device.destroy_semaphore(image_available, None) };
                return Err(err.into());
            }
        };

        Ok(Self {
            device,
            image_available,
            render_completed,
        })
    }
}

impl Drop for FrameSemaphores {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.image_available, None);
            self.device.destroy_semaphore(self.render_completed, None);
        }
    }
}
