use crate::error::Result;

use super::GpuInit;

/// Device and queue without a presentation surface.
///
/// Used for offscreen resource work (uploads, readback) and by the GPU-backed
/// tests, which skip themselves when [`HeadlessGpu::new`] finds no adapter.
pub struct HeadlessGpu {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl HeadlessGpu {
    pub async fn new(init: GpuInit) -> Result<Self> {
        let instance = init.create_instance();
        let adapter = init.request_adapter(&instance, None).await?;
        let (device, queue) = init.request_device(&adapter).await?;
        Ok(Self { device, queue })
    }

    /// Blocking variant of [`HeadlessGpu::new`].
    pub fn new_blocking(init: GpuInit) -> Result<Self> {
        pollster::block_on(Self::new(init))
    }
}
