//! Device-resident resources created once at initialization.
//!
//! - `buffer`: vertex/index/uniform buffers from typed host slices
//! - `texture`: decoded images uploaded with a fixed sampler policy

mod buffer;
mod texture;

pub use buffer::{BufferFactory, BufferUsage, GpuBuffer};
pub use texture::{DecodedImage, SamplerConfig, Texture, TextureSource};
