//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface from an injected surface target
//! - acquiring frames and providing encoders/views for rendering
//! - headless device acquisition for offscreen work and tests

mod error;
mod frame;
mod gpu;
mod headless;
mod init;
mod surface;

pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use headless::HeadlessGpu;
pub use init::GpuInit;
