/// Represents a single acquired frame.
///
/// Short-lived: holding the surface texture blocks acquisition of the next
/// frame. Dropping a `GpuFrame` without [`Gpu::submit`](super::Gpu::submit)
/// discards the recorded commands and the surface texture unpresented.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
