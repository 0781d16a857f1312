//! Swapchain creation and per-image views
//!
//! The swapchain is created once and never recreated: the window is not
//! resizable and an out-of-date surface is treated as a fatal error.

use crate::{
    error::Result,
    graphics::{device::Device, surface::{Surface, SwapchainSupport}},
};
use ash::{khr, vk};

/// Format chosen when the surface has no preference.
pub const PREFERRED_FORMAT: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
    format: vk::Format::B8G8R8A8_UNORM,
    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
};

/// Pick the surface format.
///
/// A lone `UNDEFINED` entry means any format is acceptable, so the preferred
/// one is used. Otherwise the exact preferred format and color space pair
/// wins, and the first reported format is the fallback.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    if let [only] = formats {
        if only.format == vk::Format::UNDEFINED {
            return Some(PREFERRED_FORMAT);
        }
    }

    formats
        .iter()
        .copied()
        .find(|format| {
            format.format == PREFERRED_FORMAT.format
                && format.color_space == PREFERRED_FORMAT.color_space
        })
        .or_else(|| formats.first().copied())
}

/// Mailbox when offered, otherwise FIFO (which every implementation supports).
pub fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if present_modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// Use the surface's current extent, unless it reports the `u32::MAX`
/// sentinel, in which case the requested size is clamped into the supported range.
pub fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, requested: vk::Extent2D) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    let min = capabilities.min_image_extent;
    let max = capabilities.max_image_extent;
    vk::Extent2D {
        width: requested.width.min(max.width).max(min.width),
        height: requested.height.min(max.height).max(min.height),
    }
}

/// One more image than the minimum, capped by the maximum (0 means unbounded).
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let desired = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        desired.min(capabilities.max_image_count)
    } else {
        desired
    }
}

/// The `VkSwapchainKHR` and the images it owns.
pub struct Swapchain {
    loader: khr::swapchain::Device,
    handle: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    format: vk::SurfaceFormatKHR,
    present_mode: vk::PresentModeKHR,
    extent: vk::Extent2D,
}

impl Swapchain {
    pub fn new(
        instance: &ash::Instance,
        device: &Device,
        surface: &Surface,
        requested: vk::Extent2D,
    ) -> Result<Self> {
        let SwapchainSupport {
            capabilities,
            formats,
            present_modes,
        } = surface.swapchain_support(device.physical().handle)?;

        // Device selection already rejected surfaces without formats.
        let format = choose_surface_format(&formats).unwrap_or(PREFERRED_FORMAT);
        let present_mode = choose_present_mode(&present_modes);
        let extent = choose_extent(&capabilities, requested);
        let image_count = choose_image_count(&capabilities);

        let (sharing_mode, queue_family_indices) = device.queue_families().image_sharing();

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface.handle())
            .min_image_count(image_count)
            .image_format(format.format)
            .image_color_space(format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(&queue_family_indices)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true);

        let loader = khr::swapchain::Device::new(instance, device.handle());
        let handle = unsafe { loader.create_swapchain(&create_info, None) }?;

        let mut swapchain = Self {
            loader,
            handle,
            images: Vec::new(),
            format,
            present_mode,
            extent,
        };
        swapchain.images = unsafe { swapchain.loader.get_swapchain_images(swapchain.handle) }?;

        log::info!(
            "Swapchain: {:?}/{:?}, {:?}, {}x{}, {} images ({:?})",
            format.format,
            format.color_space,
            present_mode,
            extent.width,
            extent.height,
            swapchain.images.len(),
            sharing_mode
        );

        Ok(swapchain)
    }

    pub fn handle(&self) -> vk::SwapchainKHR {
        self.handle
    }

    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }

    pub fn format(&self) -> vk::Format {
        self.format.format
    }

    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Next presentable image index, signalling `image_available` when it is
    /// ready. Waits without a timeout.
    pub fn acquire_next_image(&self, image_available: vk::Semaphore) -> Result<u32> {
        let (index, suboptimal) = unsafe {
            self.loader
                .acquire_next_image(self.handle, u64::MAX, image_available, vk::Fence::null())
        }?;
        if suboptimal {
            log::debug!("swapchain is suboptimal for the surface (image {index})");
        }
        Ok(index)
    }

    /// Queue `image_index` for presentation once `render_completed` is signalled.
    pub fn present(
        &self,
        present_queue: vk::Queue,
        image_index: u32,
        render_completed: vk::Semaphore,
    ) -> Result<()> {
        let wait_semaphores = [render_completed];
        let swapchains = [self.handle];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let suboptimal = unsafe { self.loader.queue_present(present_queue, &present_info) }?;
        if suboptimal {
            log::debug!("presented to a suboptimal swapchain");
        }
        Ok(())
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_swapchain(self.handle, None);
        }
        log::debug!("destroyed swapchain");
    }
}

/// One color view per swapchain image, in image order.
pub struct ImageViews {
    device: ash::Device,
    views: Vec<vk::ImageView>,
}

impl ImageViews {
    pub fn new(device: &Device, swapchain: &Swapchain) -> Result<Self> {
        let mut image_views = Self {
            device: device.handle().clone(),
            views: Vec::with_capacity(swapchain.images().len()),
        };

        for &image in swapchain.images() {
            let create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(swapchain.format())
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });
            // Views created so far are released by Drop if this fails.
            let view = unsafe { image_views.device.create_image_view(&create_info, None) }?;
            image_views.views.push(view);
        }

        log::debug!("created {} image views", image_views.views.len());
        Ok(image_views)
    }

    pub fn views(&self) -> &[vk::ImageView] {
        &self.views
    }
}

impl Drop for ImageViews {
    fn drop(&mut self) {
        unsafe {
            for &view in &self.views {
                self.device.destroy_image_view(view, None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn format(format: vk::Format, color_space: vk::ColorSpaceKHR) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space,
        }
    }

    fn pair(format: Option<vk::SurfaceFormatKHR>) -> Option<(vk::Format, vk::ColorSpaceKHR)> {
        format.map(|f| (f.format, f.color_space))
    }

    fn extent(width: u32, height: u32) -> vk::Extent2D {
        vk::Extent2D { width, height }
    }

    fn dims(extent: vk::Extent2D) -> (u32, u32) {
        (extent.width, extent.height)
    }

    fn capabilities(
        current: vk::Extent2D,
        min: vk::Extent2D,
        max: vk::Extent2D,
    ) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            current_extent: current,
            min_image_extent: min,
            max_image_extent: max,
            ..Default::default()
        }
    }

    const PREFERRED: (vk::Format, vk::ColorSpaceKHR) = (
        vk::Format::B8G8R8A8_UNORM,
        vk::ColorSpaceKHR::SRGB_NONLINEAR,
    );

    #[test]
    fn undefined_placeholder_selects_preferred_format() {
        let formats = [format(vk::Format::UNDEFINED, vk::ColorSpaceKHR::SRGB_NONLINEAR)];
        assert_eq!(pair(choose_surface_format(&formats)), Some(PREFERRED));
    }

    #[test]
    fn exact_preferred_pair_is_selected() {
        let formats = [
            format(vk::Format::R8G8B8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_UNORM, vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT),
            format(vk::Format::B8G8R8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];
        assert_eq!(pair(choose_surface_format(&formats)), Some(PREFERRED));
    }

    #[test]
    fn falls_back_to_first_format() {
        let formats = [
            format(vk::Format::R8G8B8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_UNORM, vk::ColorSpaceKHR::DISPLAY_P3_NONLINEAR_EXT),
        ];
        assert_eq!(
            pair(choose_surface_format(&formats)),
            Some((vk::Format::R8G8B8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR))
        );
    }

    #[test]
    fn undefined_among_others_is_not_a_placeholder() {
        let formats = [
            format(vk::Format::UNDEFINED, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];
        assert_eq!(
            pair(choose_surface_format(&formats)),
            Some((vk::Format::UNDEFINED, vk::ColorSpaceKHR::SRGB_NONLINEAR))
        );
    }

    #[test]
    fn no_formats_no_choice() {
        assert!(choose_surface_format(&[]).is_none());
    }

    #[test]
    fn mailbox_preferred_when_present() {
        let modes = [
            vk::PresentModeKHR::IMMEDIATE,
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::MAILBOX,
        ];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn fifo_fallback() {
        let modes = [vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::FIFO_RELAXED];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::FIFO);
        assert_eq!(choose_present_mode(&[]), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn current_extent_used_verbatim() {
        let caps = capabilities(extent(1920, 1080), extent(1, 1), extent(4096, 4096));
        assert_eq!(dims(choose_extent(&caps, extent(800, 600))), (1920, 1080));
    }

    #[test]
    fn sentinel_extent_clamps_requested_size() {
        let sentinel = extent(u32::MAX, u32::MAX);

        let caps = capabilities(sentinel, extent(100, 100), extent(4096, 4096));
        assert_eq!(dims(choose_extent(&caps, extent(800, 600))), (800, 600));

        let caps = capabilities(sentinel, extent(1024, 50), extent(2048, 400));
        assert_eq!(dims(choose_extent(&caps, extent(800, 600))), (1024, 400));
    }

    #[test]
    fn sentinel_is_keyed_on_width() {
        let caps = capabilities(extent(640, u32::MAX), extent(1, 1), extent(4096, 4096));
        assert_eq!(dims(choose_extent(&caps, extent(800, 600))), (640, u32::MAX));
    }

    #[test]
    fn image_count_is_one_above_minimum() {
        let caps = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(choose_image_count(&caps), 3);
    }

    #[test]
    fn image_count_respects_maximum() {
        let caps = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 2,
            ..Default::default()
        };
        assert_eq!(choose_image_count(&caps), 2);
    }
}
