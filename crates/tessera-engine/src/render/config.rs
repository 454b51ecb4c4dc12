use std::borrow::Cow;

use crate::camera::Camera;
use crate::error::Result;
use crate::geometry::Geometry;
use crate::resources::{SamplerConfig, TextureSource};

use super::bindings::BindGroupLayoutDesc;
use super::pipeline::{BlendMode, PipelineBuilder, PipelineLayout};
use super::plan::{ClearColor, FramePlan};
use super::shaders;

/// Texture bound by the fragment stage.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureBinding {
    pub source: TextureSource,
    pub sampler: SamplerConfig,
}

/// Everything that varies between render variants.
///
/// Bind groups are derived, in group order: the camera uniform (when
/// `camera` is set), then the sampler/texture pair (when `texture` is set).
/// With neither, the pipeline uses an automatic layout.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub label: String,
    pub shader: Cow<'static, str>,
    pub geometry: Geometry,
    pub texture: Option<TextureBinding>,
    pub camera: Option<Camera>,
    pub blend: Option<BlendMode>,
    pub topology: wgpu::PrimitiveTopology,
    pub clear_color: ClearColor,
}

impl RenderConfig {
    /// One solid-color triangle, three vertices, no bindings.
    pub fn triangle() -> Self {
        Self {
            label: "triangle".into(),
            shader: Cow::Borrowed(shaders::TRIANGLE),
            geometry: Geometry::triangle(),
            texture: None,
            camera: None,
            blend: None,
            topology: wgpu::PrimitiveTopology::TriangleList,
            clear_color: ClearColor::new(0.0, 0.0, 0.4, 1.0),
        }
    }

    /// Indexed quad with per-vertex colors, no bindings.
    pub fn colored_quad() -> Self {
        Self {
            label: "colored quad".into(),
            shader: Cow::Borrowed(shaders::COLORED),
            geometry: Geometry::colored_quad(),
            clear_color: ClearColor::new(0.1, 0.1, 0.12, 1.0),
            ..Self::triangle()
        }
    }

    /// Indexed, alpha-blended textured quad seen through a camera.
    pub fn textured_quad(source: TextureSource) -> Self {
        Self {
            label: "textured quad".into(),
            shader: Cow::Borrowed(shaders::TEXTURED),
            geometry: Geometry::textured_quad(),
            texture: Some(TextureBinding {
                source,
                sampler: SamplerConfig::default(),
            }),
            camera: Some(Camera::default()),
            blend: Some(BlendMode::AlphaOver),
            topology: wgpu::PrimitiveTopology::TriangleList,
            clear_color: ClearColor::new(0.67, 0.67, 0.67, 1.0),
        }
    }

    pub fn with_sampler(mut self, sampler: SamplerConfig) -> Self {
        if let Some(t) = self.texture.as_mut() {
            t.sampler = sampler;
        }
        self
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = Some(camera);
        self
    }

    /// Bind group layouts in group order.
    pub fn bind_group_layouts(&self) -> Vec<BindGroupLayoutDesc> {
        let mut groups = Vec::new();
        if self.camera.is_some() {
            groups.push(BindGroupLayoutDesc::camera());
        }
        if self.texture.is_some() {
            groups.push(BindGroupLayoutDesc::texture());
        }
        groups
    }

    pub fn pipeline_layout(&self) -> PipelineLayout {
        PipelineLayout::from_groups(self.bind_group_layouts())
    }

    /// Unbuilt pipeline for rendering into `format`.
    pub fn pipeline_builder(&self, format: wgpu::TextureFormat) -> PipelineBuilder<'_> {
        PipelineBuilder::new(format!("tessera {} pipeline", self.label), &self.shader, format)
            .vertex_layouts(self.geometry.vertex_layouts())
            .layout(self.pipeline_layout())
            .topology(self.topology)
            .blend(self.blend)
    }

    /// The per-frame command list this configuration produces.
    pub fn frame_plan(&self) -> Result<FramePlan> {
        let counts = self.geometry.validate()?;
        Ok(FramePlan::new(
            self.clear_color,
            self.geometry.streams.len() as u32,
            self.bind_group_layouts().len() as u32,
            counts,
        ))
    }

    /// Every check that does not need a device: geometry, shader interface,
    /// vertex and bind group layouts.
    pub fn validate(&self, format: wgpu::TextureFormat) -> Result<FramePlan> {
        let plan = self.frame_plan()?;
        self.pipeline_builder(format).validate()?;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::plan::FrameCommand;

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8UnormSrgb;

    fn checker() -> TextureSource {
        TextureSource::checkerboard(4, 1)
    }

    #[test]
    fn presets_validate() {
        for config in [
            RenderConfig::triangle(),
            RenderConfig::colored_quad(),
            RenderConfig::textured_quad(checker()),
        ] {
            assert!(config.validate(FORMAT).is_ok(), "{}", config.label);
        }
    }

    #[test]
    fn triangle_draws_three_vertices_without_bind_groups() {
        let config = RenderConfig::triangle();
        assert_eq!(config.pipeline_layout(), PipelineLayout::Auto);

        let stats = config.validate(FORMAT).unwrap().stats();
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.vertex_count, Some(3));
        assert_eq!(stats.index_count, None);
        assert!(stats.bind_groups.is_empty());
    }

    #[test]
    fn textured_quad_draws_six_indices_after_both_groups() {
        let config = RenderConfig::textured_quad(checker());
        assert_eq!(config.geometry.validate().unwrap().vertices, 4);
        assert_eq!(config.bind_group_layouts().len(), 2);

        let plan = config.validate(FORMAT).unwrap();
        let stats = plan.stats();
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.index_count, Some(6));
        assert_eq!(stats.bind_groups, vec![0, 1]);

        let draw_at = plan
            .commands
            .iter()
            .position(|c| matches!(c, FrameCommand::DrawIndexed { .. }))
            .unwrap();
        let last_group_at = plan
            .commands
            .iter()
            .rposition(|c| matches!(c, FrameCommand::SetBindGroup { .. }))
            .unwrap();
        assert!(last_group_at < draw_at);
        assert_eq!(draw_at, plan.commands.len() - 1);
    }

    #[test]
    fn repeated_plans_are_identical() {
        let config = RenderConfig::colored_quad();
        let first = config.frame_plan().unwrap();
        for _ in 0..4 {
            assert_eq!(config.frame_plan().unwrap(), first);
        }
    }

    #[test]
    fn textured_shader_without_camera_fails_validation() {
        let mut config = RenderConfig::textured_quad(checker());
        config.camera = None;
        assert!(config.validate(FORMAT).is_err());
    }

    #[test]
    fn mismatched_geometry_fails_validation() {
        // Triangle shader only consumes location 0; the quad also feeds colors.
        let config = RenderConfig {
            geometry: Geometry::colored_quad(),
            ..RenderConfig::triangle()
        };
        assert!(config.validate(FORMAT).is_err());
    }

    #[test]
    fn empty_geometry_fails_before_any_draw() {
        let mut config = RenderConfig::triangle();
        config.geometry.streams[0].data.clear();
        assert!(config.frame_plan().is_err());
    }
}
