use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::device::GpuInit;
use crate::render::{FrameOutcome, FrameRenderer, RenderConfig};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "tessera".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window, renders `render` into it on every redraw and returns
    /// when the window closes or a frame fails.
    pub fn run(config: RuntimeConfig, gpu_init: GpuInit, render: RenderConfig) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, render);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    renderer: FrameRenderer<'this>,
}

struct AppState {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    render: RenderConfig,

    entry: Option<WindowEntry>,
    failure: Option<anyhow::Error>,
    exit_requested: bool,
}

impl AppState {
    fn new(config: RuntimeConfig, gpu_init: GpuInit, render: RenderConfig) -> Self {
        Self {
            config,
            gpu_init,
            render,
            entry: None,
            failure: None,
            exit_requested: false,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.failure = Some(error);
        self.close(event_loop);
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(entry) = self.entry.take() {
            let frames = entry.borrow_renderer().frame_count();
            log::info!("window closed after {frames} frame(s)");
        }
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_window_entry(&self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        // The surface is configured once; the window never resizes.
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(false);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let size = window.inner_size();
        let gpu_init = self.gpu_init.clone();
        let render = self.render.clone();

        let entry = WindowEntryTryBuilder {
            window,
            renderer_builder: |w| {
                let mut renderer = FrameRenderer::new(render);
                pollster::block_on(renderer.initialize(w, size, gpu_init)).map(|()| renderer)
            },
        }
        .try_build()
        .context("renderer initialization failed")?;

        Ok(entry)
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        match self.create_window_entry(event_loop) {
            Ok(entry) => {
                entry.with_window(|w| w.request_redraw());
                self.entry = Some(entry);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        if entry.with_window(|w| w.id()) != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.close(event_loop),

            WindowEvent::RedrawRequested => {
                let result = entry.with_renderer_mut(|renderer| renderer.draw());
                match result {
                    Ok(FrameOutcome::Presented(_)) | Ok(FrameOutcome::Skipped) => {}
                    Err(e) => self.fail(event_loop, anyhow::Error::new(e).context("frame failed")),
                }
            }

            _ => {}
        }
    }
}
