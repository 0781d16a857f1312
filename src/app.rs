//! winit application: window creation and the blocking frame loop
//!
//! Each event loop iteration processes pending window events, then renders
//! one frame in `about_to_wait`. A close request exits the loop; `exiting`
//! drains the device and tears the context down before the event loop ends.

use crate::{
    config::AppConfig,
    error::{Result, TriangleError},
    graphics::GraphicsContext,
};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

/// What a finished run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub device_name: String,
    pub frames_presented: u64,
    pub framebuffer_count: usize,
    pub command_buffer_count: usize,
}

// Application state
struct App {
    config: AppConfig,
    context: Option<GraphicsContext>,
    summary: RunSummary,
    error: Option<TriangleError>,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            context: None,
            summary: RunSummary::default(),
            error: None,
        }
    }

    /// Keep the first error for the caller. Later ones are never returned,
    /// so they only go to the log.
    fn record_error(&mut self, err: TriangleError) {
        if self.error.is_none() {
            self.error = Some(err);
        } else {
            log::error!("{err}");
        }
    }

    /// Record a fatal error and leave the loop.
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: TriangleError) {
        self.record_error(err);
        event_loop.exit();
    }

    fn create_context(&self, event_loop: &ActiveEventLoop) -> Result<GraphicsContext> {
        let window = event_loop.create_window(
            Window::default_attributes()
                .with_title(self.config.window_title.clone())
                .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
                .with_resizable(false)
                .with_visible(self.config.visible),
        )?;
        GraphicsContext::new(window, &self.config)
    }

    fn frame_limit_reached(&self) -> bool {
        match (self.config.frame_limit, &self.context) {
            (Some(limit), Some(context)) => context.frames_presented() >= limit,
            _ => false,
        }
    }

    /// Drain the device, record the summary and destroy everything.
    fn shutdown(&mut self) {
        let Some(mut context) = self.context.take() else {
            return;
        };
        if let Err(err) = context.drain() {
            self.record_error(err);
        }
        self.summary.frames_presented = context.frames_presented();
        drop(context);
        log::info!("Graphics context destroyed");
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.context.is_some() || self.error.is_some() {
            return; // Already initialized (or failed to)
        }

        event_loop.set_control_flow(ControlFlow::Poll);

        match self.create_context(event_loop) {
            Ok(context) => {
                self.summary = RunSummary {
                    device_name: context.device_name().to_string(),
                    frames_presented: 0,
                    framebuffer_count: context.framebuffer_count(),
                    command_buffer_count: context.command_buffer_count(),
                };
                self.context = Some(context);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(context) = self.context.as_ref() else {
            return;
        };
        if context.window().id() != id {
            return;
        }

        if let WindowEvent::CloseRequested = event {
            log::info!("Window close requested");
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if event_loop.exiting() {
            return;
        }
        let Some(context) = self.context.as_mut() else {
            return;
        };

        if let Err(err) = context.draw_frame() {
            self.fail(event_loop, err);
            return;
        }

        if self.frame_limit_reached() {
            log::info!("Frame limit reached");
            event_loop.exit();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

/// Open the window and render until it is closed.
pub fn run(config: AppConfig) -> Result<RunSummary> {
    let event_loop = EventLoop::new()?;
    run_with_event_loop(event_loop, config)
}

/// Same as [`run`] on a caller-built event loop (tests need one that may
/// live off the main thread).
pub fn run_with_event_loop(event_loop: EventLoop<()>, config: AppConfig) -> Result<RunSummary> {
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    // Normally already done in `exiting`.
    app.shutdown();

    match app.error {
        Some(err) => Err(err),
        None => Ok(app.summary),
    }
}
