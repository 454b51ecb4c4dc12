//! Tessera engine crate.
//!
//! A minimal GPU 2D pipeline on wgpu: device and surface setup, buffer and
//! texture resources, a validating pipeline builder and a frame renderer
//! driven by a `winit` runtime.

pub mod camera;
pub mod device;
mod error;
pub mod geometry;
pub mod logging;
pub mod render;
pub mod resources;
pub mod window;

pub use error::{RenderError, Result};
