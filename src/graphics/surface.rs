//! Window surface and the queries made against it

use crate::{
    error::{Result, TriangleError},
    graphics::instance::Instance,
};
use ash::{khr, vk};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

/// What a physical device can do with a surface.
#[derive(Debug, Clone, Default)]
pub struct SwapchainSupport {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupport {
    /// A swapchain can be built when at least one format and one present mode exist.
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// `VkSurfaceKHR` bound to the application window.
pub struct Surface {
    loader: khr::surface::Instance,
    handle: vk::SurfaceKHR,
}

impl Surface {
    pub fn new(
        instance: &Instance,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> Result<Self> {
        let loader = khr::surface::Instance::new(instance.entry(), instance.handle());
        let handle = unsafe {
            ash_window::create_surface(instance.entry(), instance.handle(), display, window, None)
        }
        .map_err(TriangleError::SurfaceCreation)?;
        log::debug!("created window surface");
        Ok(Self { loader, handle })
    }

    pub fn handle(&self) -> vk::SurfaceKHR {
        self.handle
    }

    pub fn supports_present(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
    ) -> Result<bool> {
        let supported = unsafe {
            self.loader.get_physical_device_surface_support(
                physical_device,
                queue_family_index,
                self.handle,
            )
        }?;
        Ok(supported)
    }

    pub fn swapchain_support(&self, physical_device: vk::PhysicalDevice) -> Result<SwapchainSupport> {
        unsafe {
            Ok(SwapchainSupport {
                capabilities: self
                    .loader
                    .get_physical_device_surface_capabilities(physical_device, self.handle)?,
                formats: self
                    .loader
                    .get_physical_device_surface_formats(physical_device, self.handle)?,
                present_modes: self
                    .loader
                    .get_physical_device_surface_present_modes(physical_device, self.handle)?,
            })
        }
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_surface(self.handle, None);
        }
        log::debug!("destroyed window surface");
    }
}
