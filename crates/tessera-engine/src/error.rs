//! Error taxonomy for the engine.
//!
//! Every variant is fatal at the layer it is raised in. Initialization errors
//! abort `FrameRenderer::initialize`; `Surface` aborts the render loop. There is
//! no fallback renderer and no mid-frame recovery.

use thiserror::Error;

/// Errors raised by device acquisition, resource creation and frame encoding.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No backend on this platform can present to the given surface.
    #[error("GPU presentation is not supported on this platform: {0}")]
    UnsupportedPlatform(String),

    /// Adapter or device negotiation failed.
    #[error("no suitable GPU adapter: {0}")]
    NoAdapter(String),

    /// A buffer, texture, bind group or pipeline could not be built.
    #[error("failed to create {resource}: {reason}")]
    ResourceCreation {
        resource: String,
        reason: String,
    },

    /// A texture asset could not be read or decoded.
    #[error("failed to load texture '{source_name}': {reason}")]
    TextureLoad {
        source_name: String,
        reason: String,
    },

    /// An operation was called in a renderer state that does not allow it.
    #[error("renderer is {found}, expected {expected}")]
    InvalidState {
        expected: &'static str,
        found: &'static str,
    },

    /// The surface could not provide a texture for the current frame.
    #[error("surface acquisition failed: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

impl RenderError {
    pub(crate) fn resource(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ResourceCreation {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn texture(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::TextureLoad {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, RenderError>;
