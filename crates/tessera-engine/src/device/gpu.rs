use winit::dpi::PhysicalSize;

use crate::error::{RenderError, Result};

use super::surface;
use super::{GpuFrame, GpuInit};

/// Owns wgpu core objects and the surface configuration.
///
/// This type is the low-level rendering context:
/// - creates and stores Instance/Adapter/Device/Queue
/// - creates and configures the Surface for an injected target
/// - acquires frames and submits + presents them
pub struct Gpu<'w> {
    /// Kept alive for the lifetime of the surface.
    _instance: wgpu::Instance,

    /// Surface bound to the caller's drawable.
    ///
    /// The `'w` lifetime ties it to the target (e.g. a borrowed window).
    surface: wgpu::Surface<'w>,

    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,

    /// Surface configuration, chosen once at creation.
    config: wgpu::SurfaceConfiguration,
}

impl<'w> Gpu<'w> {
    /// Creates a GPU context presenting to `target`.
    ///
    /// `size` is the drawable size in physical pixels. The surface format is
    /// queried once here and never changes afterwards.
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'w>>,
        size: PhysicalSize<u32>,
        init: GpuInit,
    ) -> Result<Self> {
        if size.width == 0 || size.height == 0 {
            return Err(RenderError::resource("surface", "drawable has zero size"));
        }

        let instance = init.create_instance();

        let surface = instance
            .create_surface(target)
            .map_err(|e| RenderError::UnsupportedPlatform(e.to_string()))?;

        let adapter = init.request_adapter(&instance, Some(&surface)).await?;
        let (device, queue) = init.request_device(&adapter).await?;

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps, init.prefer_srgb).ok_or_else(|| {
            RenderError::UnsupportedPlatform("surface reports no supported formats".into())
        })?;
        let alpha_mode = surface::choose_alpha_mode(&caps, init.alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);

        log::info!(
            "surface configured: {}x{} {:?} ({:?})",
            size.width,
            size.height,
            format,
            init.present_mode
        );

        Ok(Self {
            _instance: instance,
            surface,
            adapter,
            device,
            queue,
            config,
        })
    }

    /// Returns the surface format chosen at creation.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Returns the configured drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.config.width, self.config.height)
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Acquires the next surface texture and creates an encoder.
    pub fn begin_frame(&self) -> std::result::Result<GpuFrame, wgpu::SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tessera frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the recorded commands for `frame` and presents it.
    pub fn submit(&self, frame: GpuFrame) {
        let GpuFrame {
            surface_texture,
            view,
            encoder,
        } = frame;

        self.queue.submit(std::iter::once(encoder.finish()));
        drop(view);
        surface_texture.present();
    }
}
