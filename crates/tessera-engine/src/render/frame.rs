use crate::camera::Camera;
use crate::error::{RenderError, Result};
use crate::resources::{BufferFactory, BufferUsage, GpuBuffer, Texture};

use super::bindings::{BindGroupBuilder, BindGroupLayoutDesc, BoundResource};
use super::config::RenderConfig;
use super::pipeline::Pipeline;
use super::plan::{FrameCommand, FramePlan, FrameStats};

/// Target for drawing (encoder + color view).
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(encoder: &'a mut wgpu::CommandEncoder, color_view: &'a wgpu::TextureView) -> Self {
        Self { encoder, color_view }
    }
}

/// Camera plus the uniform buffer its matrix is written to each frame.
#[derive(Debug)]
struct CameraUniform {
    camera: Camera,
    buffer: GpuBuffer,
}

/// Everything a configuration needs on the device, built once.
///
/// Independent of any surface: the renderer owns one for its window, and
/// offscreen callers can build one against a headless device.
#[derive(Debug)]
pub struct FrameResources {
    pipeline: Pipeline,
    vertex_buffers: Vec<GpuBuffer>,
    index_buffer: Option<GpuBuffer>,
    camera: Option<CameraUniform>,
    /// Kept alive for the texture bind group.
    texture: Option<Texture>,
    bind_groups: Vec<wgpu::BindGroup>,
    plan: FramePlan,
}

/// A plan command resolved to the device objects it uses.
enum Resolved<'a> {
    Pipeline(&'a wgpu::RenderPipeline),
    VertexBuffer(u32, &'a GpuBuffer),
    IndexBuffer(&'a GpuBuffer),
    BindGroup(u32, &'a wgpu::BindGroup),
    Draw(u32),
    DrawIndexed(u32),
}

impl FrameResources {
    /// Validates `config` against `format`, then uploads geometry, loads the
    /// texture, builds the pipeline and its bind groups.
    ///
    /// Device work runs inside validation and out-of-memory error scopes; a
    /// captured device error fails the build with
    /// [`RenderError::ResourceCreation`].
    ///
    /// `viewport` seeds the camera uniform; it is rewritten on every encode.
    pub async fn build(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &RenderConfig,
        format: wgpu::TextureFormat,
        viewport: (u32, u32),
    ) -> Result<Self> {
        let plan = config.validate(format)?;

        let oom_scope = device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let validation_scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let created = Self::create(device, queue, config, format, viewport, plan);
        let validation = validation_scope.pop().await;
        let oom = oom_scope.pop().await;

        match (created, validation.or(oom)) {
            (Err(e), _) => Err(e),
            (Ok(_), Some(err)) => {
                log::error!("device rejected resources for '{}': {err}", config.label);
                Err(RenderError::resource(config.label.clone(), err.to_string()))
            }
            (Ok(resources), None) => Ok(resources),
        }
    }

    /// Blocking form of [`FrameResources::build`].
    pub fn build_blocking(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &RenderConfig,
        format: wgpu::TextureFormat,
        viewport: (u32, u32),
    ) -> Result<Self> {
        pollster::block_on(Self::build(device, queue, config, format, viewport))
    }

    fn create(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &RenderConfig,
        format: wgpu::TextureFormat,
        viewport: (u32, u32),
        plan: FramePlan,
    ) -> Result<Self> {
        let groups = config.bind_group_layouts();

        let texture = config
            .texture
            .as_ref()
            .map(|t| Texture::load(device, queue, &t.source, t.sampler))
            .transpose()?;

        let factory = BufferFactory::new(device);
        let vertex_buffers = config
            .geometry
            .streams
            .iter()
            .map(|s| factory.create(&s.data, BufferUsage::Vertex, &format!("tessera {} vbo", s.label)))
            .collect::<Result<Vec<_>>>()?;
        let index_buffer = config
            .geometry
            .indices
            .as_deref()
            .map(|i| factory.create(i, BufferUsage::Index, "tessera ibo"))
            .transpose()?;

        let camera = config
            .camera
            .map(|camera| -> Result<CameraUniform> {
                let matrix = camera.update(viewport.0, viewport.1);
                let buffer = factory.create(&matrix, BufferUsage::Uniform, "tessera camera ubo")?;
                Ok(CameraUniform { camera, buffer })
            })
            .transpose()?;

        let pipeline = config.pipeline_builder(format).build(device)?;

        let mut bind_groups = Vec::with_capacity(groups.len());
        let mut group_layouts = groups.iter().enumerate();

        if let Some(cam) = &camera {
            let (index, desc) = next_group(&mut group_layouts)?;
            let builder = BindGroupBuilder::new(desc).bind(0, BoundResource::Buffer(&cam.buffer));
            bind_groups.push(builder.build(device, group_layout(&pipeline, index)?)?);
        }
        if let Some(tex) = &texture {
            let (index, desc) = next_group(&mut group_layouts)?;
            let builder = BindGroupBuilder::new(desc)
                .bind(0, BoundResource::Sampler(tex.sampler()))
                .bind(1, BoundResource::TextureView(tex.view()));
            bind_groups.push(builder.build(device, group_layout(&pipeline, index)?)?);
        }

        log::info!(
            "frame resources ready for '{}': {} vertex buffers, index buffer: {}, {} bind groups",
            config.label,
            vertex_buffers.len(),
            index_buffer.is_some(),
            bind_groups.len()
        );

        Ok(Self {
            pipeline,
            vertex_buffers,
            index_buffer,
            camera,
            texture,
            bind_groups,
            plan,
        })
    }

    pub fn plan(&self) -> &FramePlan {
        &self.plan
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    /// Camera uniform buffer, when the configuration has a camera.
    pub fn camera_buffer(&self) -> Option<&GpuBuffer> {
        self.camera.as_ref().map(|c| &c.buffer)
    }

    /// Writes per-frame uniforms for a `width`x`height` viewport.
    ///
    /// Queue writes land before any later submission on the same queue.
    pub fn write_uniforms(&self, queue: &wgpu::Queue, width: u32, height: u32) -> Result<()> {
        if let Some(cam) = &self.camera {
            cam.buffer.write(queue, 0, &cam.camera.update(width, height))?;
        }
        Ok(())
    }

    /// Records one render pass that clears `target` and replays the plan.
    ///
    /// Every command is resolved before the pass begins, so a failure leaves
    /// the encoder untouched.
    pub fn encode(&self, target: RenderTarget<'_>) -> Result<FrameStats> {
        let resolved = self
            .plan
            .commands
            .iter()
            .map(|cmd| self.resolve(*cmd))
            .collect::<Result<Vec<_>>>()?;

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tessera frame pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.plan.clear_color.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        for cmd in resolved {
            match cmd {
                Resolved::Pipeline(p) => rpass.set_pipeline(p),
                Resolved::VertexBuffer(slot, b) => rpass.set_vertex_buffer(slot, b.slice()),
                Resolved::IndexBuffer(b) => rpass.set_index_buffer(b.slice(), wgpu::IndexFormat::Uint16),
                Resolved::BindGroup(index, g) => rpass.set_bind_group(index, g, &[]),
                Resolved::Draw(count) => rpass.draw(0..count, 0..1),
                Resolved::DrawIndexed(count) => rpass.draw_indexed(0..count, 0, 0..1),
            }
        }

        Ok(self.plan.stats())
    }

    fn resolve(&self, cmd: FrameCommand) -> Result<Resolved<'_>> {
        let missing = |what: String| RenderError::resource("frame", format!("{what} does not exist"));

        Ok(match cmd {
            FrameCommand::SetPipeline => Resolved::Pipeline(self.pipeline.raw()),
            FrameCommand::SetVertexBuffer { slot } => Resolved::VertexBuffer(
                slot,
                self.vertex_buffers
                    .get(slot as usize)
                    .ok_or_else(|| missing(format!("vertex buffer {slot}")))?,
            ),
            FrameCommand::SetIndexBuffer => Resolved::IndexBuffer(
                self.index_buffer
                    .as_ref()
                    .ok_or_else(|| missing("index buffer".into()))?,
            ),
            FrameCommand::SetBindGroup { index } => Resolved::BindGroup(
                index,
                self.bind_groups
                    .get(index as usize)
                    .ok_or_else(|| missing(format!("bind group {index}")))?,
            ),
            FrameCommand::Draw { vertex_count } => Resolved::Draw(vertex_count),
            FrameCommand::DrawIndexed { index_count } => Resolved::DrawIndexed(index_count),
        })
    }
}

fn next_group<'a, I>(groups: &mut I) -> Result<(usize, &'a BindGroupLayoutDesc)>
where
    I: Iterator<Item = (usize, &'a BindGroupLayoutDesc)>,
{
    groups
        .next()
        .ok_or_else(|| RenderError::resource("bind groups", "configuration declares fewer groups than it binds"))
}

fn group_layout(pipeline: &Pipeline, index: usize) -> Result<&wgpu::BindGroupLayout> {
    pipeline.bind_group_layout(index).ok_or_else(|| {
        RenderError::resource("bind groups", format!("pipeline has no layout for group {index}"))
    })
}
