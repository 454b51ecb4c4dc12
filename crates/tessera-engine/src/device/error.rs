/// High-level response after a surface acquisition error.
///
/// Surface reconfiguration is not performed, so every error other than a
/// timeout ends the render loop.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Transient error; skip the current frame without encoding anything.
    SkipFrame,
    /// Lost/outdated surface or out of memory; terminate.
    Fatal,
}

impl SurfaceErrorAction {
    pub fn classify(err: &wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Timeout => Self::SkipFrame,
            _ => Self::Fatal,
        }
    }
}
