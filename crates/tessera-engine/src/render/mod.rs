//! GPU rendering subsystem.
//!
//! A [`RenderConfig`] describes one scene (shader, geometry, optional camera
//! and texture). [`FrameRenderer`] validates it against the reflected shader
//! interface, builds every device object once, then replays a fixed
//! [`FramePlan`] each frame.
//!
//! Convention:
//! - Vertex streams feed one buffer slot each, in stream order.
//! - Bind groups are bound in ascending group order before the single draw.

mod bindings;
mod config;
mod frame;
mod layout;
mod pipeline;
mod plan;
mod renderer;
mod shader;
pub mod shaders;

pub use bindings::{BindGroupBuilder, BindGroupLayoutDesc, BindingKind, BindingSlot, BoundResource};
pub use config::{RenderConfig, TextureBinding};
pub use frame::{FrameResources, RenderTarget};
pub use layout::VertexLayout;
pub use pipeline::{BlendMode, Pipeline, PipelineBuilder, PipelineLayout};
pub use plan::{ClearColor, FrameCommand, FrameOutcome, FramePlan, FrameStats};
pub use renderer::{FrameRenderer, RendererStatus};
pub use shader::{FRAGMENT_ENTRY, NumericClass, ShaderBinding, ShaderBindingKind, ShaderInterface, VERTEX_ENTRY};
