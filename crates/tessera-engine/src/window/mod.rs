//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and a single Window, and drives a
//! [`FrameRenderer`](crate::render::FrameRenderer) bound to it.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
