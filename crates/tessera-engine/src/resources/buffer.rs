use std::num::NonZeroU64;

use bytemuck::Pod;
use wgpu::util::DeviceExt;

use crate::error::{RenderError, Result};

/// What a buffer is bound as.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferUsage {
    Vertex,
    Index,
    Uniform,
}

impl BufferUsage {
    /// Device usage flags. Every buffer accepts explicit writes and readback copies.
    pub fn wgpu_usages(self) -> wgpu::BufferUsages {
        let base = wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC;
        match self {
            BufferUsage::Vertex => base | wgpu::BufferUsages::VERTEX,
            BufferUsage::Index => base | wgpu::BufferUsages::INDEX,
            BufferUsage::Uniform => base | wgpu::BufferUsages::UNIFORM,
        }
    }
}

/// Fixed-size device buffer created from host data.
///
/// `byte_len` is the exact length of the data the buffer was created from. The
/// allocation itself may be padded to `COPY_BUFFER_ALIGNMENT`; slices and
/// bindings never expose the padding.
#[derive(Debug)]
pub struct GpuBuffer {
    raw: wgpu::Buffer,
    usage: BufferUsage,
    byte_len: NonZeroU64,
    label: String,
}

impl GpuBuffer {
    pub fn raw(&self) -> &wgpu::Buffer {
        &self.raw
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    pub fn byte_len(&self) -> u64 {
        self.byte_len.get()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Slice covering exactly the content bytes.
    pub fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.raw.slice(..self.byte_len.get())
    }

    /// Binding resource covering exactly the content bytes.
    pub fn as_binding(&self) -> wgpu::BindingResource<'_> {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.raw,
            offset: 0,
            size: Some(self.byte_len),
        })
    }

    /// Queues a write of `data` at `offset`.
    ///
    /// The write becomes visible to the next submission on `queue`.
    pub fn write<T: Pod>(&self, queue: &wgpu::Queue, offset: u64, data: &[T]) -> Result<()> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        check_write(&self.label, self.byte_len.get(), offset, bytes.len() as u64)?;
        queue.write_buffer(&self.raw, offset, bytes);
        Ok(())
    }

    /// Copies the buffer back to host memory, blocking until the device is done.
    pub fn read_back(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Vec<u8>> {
        let padded = self.raw.size();
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessera readback staging"),
            size: padded,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tessera readback encoder"),
        });
        encoder.copy_buffer_to_buffer(&self.raw, 0, &staging, 0, padded);
        queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = std::sync::mpsc::channel();
        let slice = staging.slice(..);
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });

        device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| RenderError::resource(&self.label, format!("device poll failed: {e}")))?;

        rx.recv()
            .map_err(|_| RenderError::resource(&self.label, "readback callback dropped"))?
            .map_err(|e| RenderError::resource(&self.label, format!("map failed: {e}")))?;

        let bytes = {
            let view = slice.get_mapped_range();
            view[..self.byte_len.get() as usize].to_vec()
        };
        staging.unmap();

        Ok(bytes)
    }
}

/// Creates device buffers from typed host slices.
pub struct BufferFactory<'a> {
    device: &'a wgpu::Device,
}

impl<'a> BufferFactory<'a> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self { device }
    }

    /// Allocates a buffer holding a copy of `data`.
    ///
    /// Empty input is rejected: a zero-length vertex or index buffer can only
    /// produce a zero-length draw.
    pub fn create<T: Pod>(&self, data: &[T], usage: BufferUsage, label: &str) -> Result<GpuBuffer> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let byte_len = content_len(label, bytes)?;

        let raw = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytes,
                usage: usage.wgpu_usages(),
            });

        log::debug!("created {usage:?} buffer '{label}' ({byte_len} bytes)");

        Ok(GpuBuffer {
            raw,
            usage,
            byte_len,
            label: label.to_owned(),
        })
    }
}

fn content_len(label: &str, bytes: &[u8]) -> Result<NonZeroU64> {
    NonZeroU64::new(bytes.len() as u64)
        .ok_or_else(|| RenderError::resource(format!("buffer '{label}'"), "data is empty"))
}

fn check_write(label: &str, byte_len: u64, offset: u64, len: u64) -> Result<()> {
    let resource = || format!("buffer '{label}' write");

    if len == 0 {
        return Err(RenderError::resource(resource(), "data is empty"));
    }
    if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0 || len % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
        return Err(RenderError::resource(
            resource(),
            format!("offset {offset} and length {len} must be multiples of 4"),
        ));
    }
    match offset.checked_add(len) {
        Some(end) if end <= byte_len => Ok(()),
        _ => Err(RenderError::resource(
            resource(),
            format!("{len} bytes at offset {offset} exceed buffer length {byte_len}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── content_len ───────────────────────────────────────────────────────

    #[test]
    fn content_len_matches_input_bytes() {
        let verts = [0.5f32; 6];
        let bytes: &[u8] = bytemuck::cast_slice(&verts);
        assert_eq!(content_len("v", bytes).unwrap().get(), 24);

        let indices = [0u16, 1, 2];
        let bytes: &[u8] = bytemuck::cast_slice(&indices);
        assert_eq!(content_len("i", bytes).unwrap().get(), 6);
    }

    #[test]
    fn empty_data_is_rejected() {
        let err = content_len("empty", &[]).unwrap_err();
        assert!(matches!(err, RenderError::ResourceCreation { .. }));
    }

    // ── check_write ───────────────────────────────────────────────────────

    #[test]
    fn write_within_bounds() {
        assert!(check_write("u", 64, 0, 64).is_ok());
        assert!(check_write("u", 64, 16, 48).is_ok());
    }

    #[test]
    fn write_past_end_is_rejected() {
        assert!(check_write("u", 64, 16, 64).is_err());
        assert!(check_write("u", 64, u64::MAX - 3, 4).is_err());
    }

    #[test]
    fn unaligned_write_is_rejected() {
        assert!(check_write("u", 64, 2, 4).is_err());
        assert!(check_write("u", 64, 0, 6).is_err());
    }

    // ── usage flags ───────────────────────────────────────────────────────

    #[test]
    fn usages_allow_write_and_readback() {
        for usage in [BufferUsage::Vertex, BufferUsage::Index, BufferUsage::Uniform] {
            let flags = usage.wgpu_usages();
            assert!(flags.contains(wgpu::BufferUsages::COPY_DST));
            assert!(flags.contains(wgpu::BufferUsages::COPY_SRC));
        }
        assert!(BufferUsage::Uniform.wgpu_usages().contains(wgpu::BufferUsages::UNIFORM));
        assert!(!BufferUsage::Vertex.wgpu_usages().contains(wgpu::BufferUsages::INDEX));
    }
}
