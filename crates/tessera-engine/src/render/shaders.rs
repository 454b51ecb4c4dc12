//! WGSL sources for the built-in render variants.
//!
//! Every module exposes `vertexMain` and `fragmentMain`. Vertex input
//! locations: 0 = position, 1 = color, 2 = uv.

/// Solid-color triangle; position only.
pub const TRIANGLE: &str = include_str!("shaders/triangle.wgsl");

/// Per-vertex color; position + color.
pub const COLORED: &str = include_str!("shaders/colored.wgsl");

/// Camera-transformed textured quad; position + color + uv, camera uniform in
/// group 0, sampler/texture in group 1.
pub const TEXTURED: &str = include_str!("shaders/textured.wgsl");
