use winit::dpi::PhysicalSize;

use crate::device::{Gpu, GpuInit, SurfaceErrorAction};
use crate::error::{RenderError, Result};

use super::config::RenderConfig;
use super::frame::{FrameResources, RenderTarget};
use super::plan::FrameOutcome;

/// Observable renderer lifecycle.
///
/// `draw()` is synchronous, so the transient drawing phase is never visible
/// from outside and a drawing renderer reports `Ready`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RendererStatus {
    Uninitialized,
    Initializing,
    Ready,
}

impl RendererStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RendererStatus::Uninitialized => "uninitialized",
            RendererStatus::Initializing => "initializing",
            RendererStatus::Ready => "ready",
        }
    }
}

struct Ready<'w> {
    gpu: Gpu<'w>,
    resources: FrameResources,
}

enum State<'w> {
    Uninitialized,
    Initializing,
    Ready(Box<Ready<'w>>),
}

/// Renders one configured scene to a surface, one complete frame per `draw()`.
///
/// Lifecycle: `new` → `initialize` (once) → `draw` (any number of times).
/// The `'w` lifetime ties the renderer to its surface target.
pub struct FrameRenderer<'w> {
    config: RenderConfig,
    state: State<'w>,
    frame_count: u64,
}

impl<'w> FrameRenderer<'w> {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            state: State::Uninitialized,
            frame_count: 0,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn status(&self) -> RendererStatus {
        self.state.status()
    }

    /// Surface format chosen at initialization.
    pub fn surface_format(&self) -> Option<wgpu::TextureFormat> {
        match &self.state {
            State::Ready(ready) => Some(ready.gpu.surface_format()),
            _ => None,
        }
    }

    /// Frames presented so far. Skipped frames are not counted.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn resources(&self) -> Option<&FrameResources> {
        match &self.state {
            State::Ready(ready) => Some(&ready.resources),
            _ => None,
        }
    }

    /// Acquires a device for `target` and builds every resource the
    /// configuration needs.
    ///
    /// Only valid once, from `Uninitialized`. On failure the renderer returns
    /// to `Uninitialized` and holds nothing. Dropping the returned future
    /// before it completes has the same effect.
    pub async fn initialize(
        &mut self,
        target: impl Into<wgpu::SurfaceTarget<'w>>,
        size: PhysicalSize<u32>,
        init: GpuInit,
    ) -> Result<()> {
        let build = Self::build(&self.config, target, size, init);
        Self::transition(&mut self.state, &self.config.label, build).await
    }

    /// Moves `state` through `Initializing` while `build` runs.
    async fn transition(
        state: &mut State<'w>,
        label: &str,
        build: impl Future<Output = Result<Ready<'w>>>,
    ) -> Result<()> {
        state.expect(RendererStatus::Uninitialized)?;
        let pending = PendingInit::start(state);
        let ready = build.await?;

        let adapter = ready.gpu.adapter_info();
        log::info!(
            "renderer '{label}' ready on {} ({:?}, {:?})",
            adapter.name,
            adapter.backend,
            ready.gpu.surface_format()
        );
        pending.finish(ready);
        Ok(())
    }

    async fn build(
        config: &RenderConfig,
        target: impl Into<wgpu::SurfaceTarget<'w>>,
        size: PhysicalSize<u32>,
        init: GpuInit,
    ) -> Result<Ready<'w>> {
        let gpu = Gpu::new(target, size, init).await?;
        let resources = FrameResources::build(
            gpu.device(),
            gpu.queue(),
            config,
            gpu.surface_format(),
            (size.width, size.height),
        )
        .await?;
        Ok(Ready { gpu, resources })
    }

    /// Encodes, submits and presents one frame.
    ///
    /// A surface timeout skips the frame without encoding anything. Any
    /// failure after acquisition drops the frame unsubmitted.
    pub fn draw(&mut self) -> Result<FrameOutcome> {
        let found = self.status();
        let State::Ready(ready) = &self.state else {
            return Err(RenderError::InvalidState {
                expected: RendererStatus::Ready.as_str(),
                found: found.as_str(),
            });
        };

        let mut frame = match ready.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(e) => match SurfaceErrorAction::classify(&e) {
                SurfaceErrorAction::SkipFrame => {
                    log::debug!("frame skipped: {e}");
                    return Ok(FrameOutcome::Skipped);
                }
                SurfaceErrorAction::Fatal => return Err(e.into()),
            },
        };

        let size = ready.gpu.size();
        ready
            .resources
            .write_uniforms(ready.gpu.queue(), size.width, size.height)?;

        let mut stats = ready
            .resources
            .encode(RenderTarget::new(&mut frame.encoder, &frame.view))?;
        ready.gpu.submit(frame);

        stats.frame_index = self.frame_count;
        self.frame_count += 1;
        log::trace!(
            "frame {} presented: {} draw call(s), bind groups {:?}",
            stats.frame_index,
            stats.draw_calls,
            stats.bind_groups
        );

        Ok(FrameOutcome::Presented(stats))
    }
}

impl State<'_> {
    fn status(&self) -> RendererStatus {
        match self {
            State::Uninitialized => RendererStatus::Uninitialized,
            State::Initializing => RendererStatus::Initializing,
            State::Ready(_) => RendererStatus::Ready,
        }
    }

    fn expect(&self, expected: RendererStatus) -> Result<()> {
        let found = self.status();
        if found == expected {
            Ok(())
        } else {
            Err(RenderError::InvalidState {
                expected: expected.as_str(),
                found: found.as_str(),
            })
        }
    }
}

/// Holds a renderer in `Initializing`; resets it to `Uninitialized` when
/// dropped without [`PendingInit::finish`].
struct PendingInit<'a, 'w> {
    state: &'a mut State<'w>,
}

impl<'a, 'w> PendingInit<'a, 'w> {
    fn start(state: &'a mut State<'w>) -> Self {
        *state = State::Initializing;
        Self { state }
    }

    fn finish(self, ready: Ready<'w>) {
        *self.state = State::Ready(Box::new(ready));
    }
}

impl Drop for PendingInit<'_, '_> {
    fn drop(&mut self) {
        if matches!(self.state, State::Initializing) {
            *self.state = State::Uninitialized;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Waker};

    use super::*;

    #[test]
    fn new_renderer_is_uninitialized() {
        let r = FrameRenderer::new(RenderConfig::triangle());
        assert_eq!(r.status(), RendererStatus::Uninitialized);
        assert_eq!(r.surface_format(), None);
        assert_eq!(r.frame_count(), 0);
        assert!(r.resources().is_none());
    }

    #[test]
    fn draw_before_initialize_is_rejected() {
        let mut r = FrameRenderer::new(RenderConfig::colored_quad());
        match r.draw() {
            Err(RenderError::InvalidState { expected, found }) => {
                assert_eq!(expected, "ready");
                assert_eq!(found, "uninitialized");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(r.frame_count(), 0);
    }

    // ── initialization ──

    fn no_adapter() -> RenderError {
        RenderError::NoAdapter("no adapter in test".into())
    }

    #[test]
    fn failed_initialize_returns_to_uninitialized() {
        let mut r = FrameRenderer::new(RenderConfig::triangle());
        let build = async { Err::<Ready<'_>, _>(no_adapter()) };
        let err = pollster::block_on(FrameRenderer::transition(&mut r.state, "test", build)).unwrap_err();

        assert!(matches!(err, RenderError::NoAdapter(_)));
        assert_eq!(r.status(), RendererStatus::Uninitialized);
        assert!(r.resources().is_none());

        // A failed attempt leaves the renderer free to try again.
        let retry = async { Err::<Ready<'_>, _>(no_adapter()) };
        let err = pollster::block_on(FrameRenderer::transition(&mut r.state, "test", retry)).unwrap_err();
        assert!(matches!(err, RenderError::NoAdapter(_)));
    }

    /// Polls `fut` once; returns whether it completed.
    fn poll_once<F: Future>(fut: Pin<&mut F>) -> bool {
        let mut cx = Context::from_waker(Waker::noop());
        fut.poll(&mut cx).is_ready()
    }

    #[test]
    fn initialize_while_initializing_is_rejected() {
        let mut r = FrameRenderer::new(RenderConfig::triangle());
        let mut first = Box::pin(FrameRenderer::transition(
            &mut r.state,
            "test",
            std::future::pending::<Result<Ready<'_>>>(),
        ));
        assert!(!poll_once(first.as_mut()));
        // Leak the in-flight attempt so its guard never runs.
        std::mem::forget(first);
        assert_eq!(r.status(), RendererStatus::Initializing);

        let second = async { Err::<Ready<'_>, _>(no_adapter()) };
        match pollster::block_on(FrameRenderer::transition(&mut r.state, "test", second)) {
            Err(RenderError::InvalidState { expected, found }) => {
                assert_eq!(expected, "uninitialized");
                assert_eq!(found, "initializing");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(r.status(), RendererStatus::Initializing);
    }

    #[test]
    fn cancelled_initialize_returns_to_uninitialized() {
        let mut r = FrameRenderer::new(RenderConfig::triangle());
        {
            let mut attempt = Box::pin(FrameRenderer::transition(
                &mut r.state,
                "test",
                std::future::pending::<Result<Ready<'_>>>(),
            ));
            assert!(!poll_once(attempt.as_mut()));
        }
        assert_eq!(r.status(), RendererStatus::Uninitialized);
    }

    #[test]
    fn status_names() {
        assert_eq!(RendererStatus::Initializing.as_str(), "initializing");
        assert_eq!(RendererStatus::Ready.as_str(), "ready");
    }
}
