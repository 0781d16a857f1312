//! The graphics context: every Vulkan object the triangle needs
//!
//! Objects are created in dependency order inside [`GraphicsContext::new`].
//! Each one is an owned value that releases its handle on drop, so a failure
//! partway through unwinds whatever was already created, and a device-owned
//! object can only exist once the logical device does.

use crate::{
    config::AppConfig,
    error::Result,
    graphics::{
        commands::DrawCommands,
        device::{select_physical_device, Device},
        frame::{FramePhase, FrameTracker},
        framebuffer::Framebuffers,
        instance::Instance,
        pipeline::Pipeline,
        render_pass::RenderPass,
        surface::Surface,
        swapchain::{ImageViews, Swapchain},
        sync::FrameSemaphores,
    },
};
use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::window::Window;

/// Owns the window and all Vulkan state.
///
/// Field order is teardown order: Rust drops fields top to bottom, which
/// gives framebuffers → image views → swapchain → pipeline (+ layout) →
/// render pass → command pool → semaphores → device → surface → instance →
/// window.
pub struct GraphicsContext {
    frame: FrameTracker,
    framebuffers: Framebuffers,
    image_views: ImageViews,
    swapchain: Swapchain,
    #[allow(dead_code)] // held for drop order
    pipeline: Pipeline,
    #[allow(dead_code)]
    render_pass: RenderPass,
    commands: DrawCommands,
    semaphores: FrameSemaphores,
    device: Device,
    #[allow(dead_code)]
    surface: Surface,
    #[allow(dead_code)]
    instance: Instance,
    window: Window,
}

impl GraphicsContext {
    /// Build the whole context for `window`
    ///
    /// Creation order:
    /// 1. Instance (+ validation layers when enabled)
    /// 2. Surface for the window
    /// 3. First suitable physical device, then the logical device and queues
    /// 4. Swapchain and one image view per image
    /// 5. Render pass and graphics pipeline
    /// 6. Framebuffers, command pool and pre-recorded command buffers
    /// 7. The two frame semaphores
    ///
    /// Every device-owned object is constructed from a `&Device`, so none of
    /// them can exist if `Device::new` fails. An early return here drops only
    /// the surface and instance, and nothing device-owned is ever destroyed.
    pub fn new(window: Window, config: &AppConfig) -> Result<Self> {
        let display_handle = window.display_handle()?.as_raw();
        let window_handle = window.window_handle()?.as_raw();

        let instance = Instance::new(config, display_handle)?;
        let surface = Surface::new(&instance, display_handle, window_handle)?;

        let physical = select_physical_device(&instance, &surface)?;
        let device = Device::new(&instance, physical, config)?;

        let size = window.inner_size();
        let requested = vk::Extent2D {
            width: size.width,
            height: size.height,
        };
        let swapchain = Swapchain::new(instance.handle(), &device, &surface, requested)?;
        let image_views = ImageViews::new(&device, &swapchain)?;

        let render_pass = RenderPass::new(&device, swapchain.format())?;
        let pipeline = Pipeline::new(&device, &render_pass, swapchain.extent(), config)?;

        let framebuffers = Framebuffers::new(
            &device,
            &render_pass,
            image_views.views(),
            swapchain.extent(),
        )?;
        let commands = DrawCommands::record(
            &device,
            &render_pass,
            &pipeline,
            &framebuffers,
            swapchain.extent(),
        )?;

        let semaphores = FrameSemaphores::new(&device)?;

        log::info!(
            "Graphics context ready: {} framebuffers, {} command buffers",
            framebuffers.len(),
            commands.len()
        );

        Ok(Self {
            frame: FrameTracker::default(),
            framebuffers,
            image_views,
            swapchain,
            pipeline,
            render_pass,
            commands,
            semaphores,
            device,
            surface,
            instance,
            window,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn device_name(&self) -> &str {
        &self.device.physical().name
    }

    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn command_buffer_count(&self) -> usize {
        self.commands.len()
    }

    pub fn image_view_count(&self) -> usize {
        self.image_views.views().len()
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    pub fn phase(&self) -> FramePhase {
        self.frame.phase()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frame.frames_presented()
    }

    /// Acquire → submit → present one frame.
    ///
    /// Acquisition waits without a timeout. Any error is fatal for the caller;
    /// the tracker is returned to idle so the context can still be drained.
    pub fn draw_frame(&mut self) -> Result<()> {
        let result = self.run_frame();
        if result.is_err() {
            self.frame.abort();
        }
        result
    }

    fn run_frame(&mut self) -> Result<()> {
        self.frame.enter(FramePhase::Acquiring)?;
        let image_index = self
            .swapchain
            .acquire_next_image(self.semaphores.image_available)?;

        self.frame.enter(FramePhase::Submitting)?;
        let command_buffers = [self.commands.for_image(image_index)?];
        let wait_semaphores = [self.semaphores.image_available];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [self.semaphores.render_completed];
        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);
        unsafe {
            self.device.handle().queue_submit(
                self.device.graphics_queue(),
                &[submit_info],
                vk::Fence::null(),
            )
        }?;

        self.frame.enter(FramePhase::Presenting)?;
        self.swapchain.present(
            self.device.present_queue(),
            image_index,
            self.semaphores.render_completed,
        )?;

        self.frame.enter(FramePhase::Idle)?;
        Ok(())
    }

    /// Wait for the GPU to finish so nothing in flight is destroyed.
    ///
    /// Idempotent: once terminated, further calls do nothing.
    pub fn drain(&mut self) -> Result<()> {
        if self.frame.phase() == FramePhase::Terminated {
            return Ok(());
        }
        if self.frame.phase() != FramePhase::Draining {
            self.frame.enter(FramePhase::Draining)?;
        }
        self.device.wait_idle()?;
        self.frame.enter(FramePhase::Terminated)?;
        log::info!(
            "Device idle after {} presented frames",
            self.frame.frames_presented()
        );
        Ok(())
    }
}

impl Drop for GraphicsContext {
    fn drop(&mut self) {
        if let Err(err) = self.drain() {
            log::error!("failed to drain device before teardown: {err}");
        }
    }
}
