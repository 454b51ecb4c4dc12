use std::collections::{BTreeMap, BTreeSet};

use crate::error::{RenderError, Result};

use super::bindings::{BindGroupLayoutDesc, BindingKind};
use super::layout::VertexLayout;
use super::shader::{FRAGMENT_ENTRY, NumericClass, ShaderInterface, VERTEX_ENTRY};

/// Fixed blend policies.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BlendMode {
    /// color = src * 1 + dst * (1 - srcAlpha); alpha = srcAlpha * 1 + dstAlpha * 0.
    AlphaOver,
}

impl BlendMode {
    pub fn state(self) -> wgpu::BlendState {
        match self {
            BlendMode::AlphaOver => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::Zero,
                    operation: wgpu::BlendOperation::Add,
                },
            },
        }
    }
}

/// Pipeline layout mode.
///
/// `Auto` lets the device infer the layout and is only valid for shaders with
/// no resource bindings. `Explicit` lists bind group layouts in group order.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineLayout {
    Auto,
    Explicit(Vec<BindGroupLayoutDesc>),
}

impl PipelineLayout {
    /// `Auto` for no groups, `Explicit` otherwise.
    pub fn from_groups(groups: Vec<BindGroupLayoutDesc>) -> Self {
        if groups.is_empty() {
            PipelineLayout::Auto
        } else {
            PipelineLayout::Explicit(groups)
        }
    }

    pub fn groups(&self) -> &[BindGroupLayoutDesc] {
        match self {
            PipelineLayout::Auto => &[],
            PipelineLayout::Explicit(groups) => groups,
        }
    }
}

/// An immutable render pipeline plus the bind group layouts it was built with.
#[derive(Debug)]
pub struct Pipeline {
    raw: wgpu::RenderPipeline,
    bind_group_layouts: Vec<wgpu::BindGroupLayout>,
}

impl Pipeline {
    pub fn raw(&self) -> &wgpu::RenderPipeline {
        &self.raw
    }

    /// Layout of bind group `group`, for explicit layouts.
    pub fn bind_group_layout(&self, group: usize) -> Option<&wgpu::BindGroupLayout> {
        self.bind_group_layouts.get(group)
    }
}

/// Configures and validates a render pipeline.
///
/// All structural checks run in [`PipelineBuilder::validate`] before any
/// device call; [`PipelineBuilder::build`] runs them again and only then
/// creates device objects.
#[derive(Debug, Clone)]
pub struct PipelineBuilder<'a> {
    label: String,
    shader_source: &'a str,
    vertex_layouts: Vec<VertexLayout>,
    layout: PipelineLayout,
    format: wgpu::TextureFormat,
    topology: wgpu::PrimitiveTopology,
    blend: Option<BlendMode>,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(label: impl Into<String>, shader_source: &'a str, format: wgpu::TextureFormat) -> Self {
        Self {
            label: label.into(),
            shader_source,
            vertex_layouts: Vec::new(),
            layout: PipelineLayout::Auto,
            format,
            topology: wgpu::PrimitiveTopology::TriangleList,
            blend: None,
        }
    }

    pub fn vertex_layouts(mut self, layouts: Vec<VertexLayout>) -> Self {
        self.vertex_layouts = layouts;
        self
    }

    pub fn layout(mut self, layout: PipelineLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn topology(mut self, topology: wgpu::PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    pub fn blend(mut self, blend: Option<BlendMode>) -> Self {
        self.blend = blend;
        self
    }

    /// Checks vertex layouts and bind group layouts against the shader interface.
    pub fn validate(&self) -> Result<ShaderInterface> {
        let interface = ShaderInterface::reflect(&self.label, self.shader_source)?;
        let resource = || format!("pipeline '{}'", self.label);

        // ── vertex inputs ─────────────────────────────────────────────────

        let mut provided = BTreeMap::new();
        for (slot, layout) in self.vertex_layouts.iter().enumerate() {
            if let Some(attr) = layout.overflowing_attribute() {
                return Err(RenderError::resource(
                    resource(),
                    format!(
                        "vertex buffer {slot}: location {} overruns stride {}",
                        attr.shader_location,
                        layout.stride()
                    ),
                ));
            }
            for attr in layout.attributes() {
                if provided.insert(attr.shader_location, attr.format).is_some() {
                    return Err(RenderError::resource(
                        resource(),
                        format!(
                            "shader location {} provided by more than one attribute",
                            attr.shader_location
                        ),
                    ));
                }
            }
        }

        let expected = interface.vertex_locations();
        let given: BTreeSet<u32> = provided.keys().copied().collect();
        if given != expected {
            let missing: Vec<_> = expected.difference(&given).collect();
            let extra: Vec<_> = given.difference(&expected).collect();
            return Err(RenderError::resource(
                resource(),
                format!(
                    "vertex layout locations do not match '{VERTEX_ENTRY}' inputs \
                     (missing {missing:?}, unused {extra:?})"
                ),
            ));
        }

        // Same key sets, so both maps iterate in step.
        for ((location, format), input) in provided.iter().zip(interface.vertex_inputs.values()) {
            if NumericClass::of_format(*format) != *input {
                return Err(RenderError::resource(
                    resource(),
                    format!(
                        "vertex format {format:?} at location {location} does not match \
                         the shader's {input:?} input"
                    ),
                ));
            }
        }

        // ── bindings ──────────────────────────────────────────────────────

        match &self.layout {
            PipelineLayout::Auto => {
                if let Some(b) = interface.bindings.first() {
                    return Err(RenderError::resource(
                        resource(),
                        format!(
                            "shader binds @group({}) @binding({}); an explicit layout is required",
                            b.group, b.binding
                        ),
                    ));
                }
            }
            PipelineLayout::Explicit(groups) => {
                for g in groups {
                    g.check()?;
                }
                for b in &interface.bindings {
                    let slot = groups
                        .get(b.group as usize)
                        .and_then(|g| g.slot(b.binding))
                        .ok_or_else(|| {
                            RenderError::resource(
                                resource(),
                                format!(
                                    "@group({}) @binding({}) is not declared in the layout",
                                    b.group, b.binding
                                ),
                            )
                        })?;

                    let kind = b.kind.map(BindingKind::from);
                    if kind != Some(slot.kind) {
                        return Err(RenderError::resource(
                            resource(),
                            format!(
                                "@group({}) @binding({}) is {:?} in the shader, {:?} in the layout",
                                b.group, b.binding, b.kind, slot.kind
                            ),
                        ));
                    }
                    if !slot.visibility.contains(b.stages) {
                        return Err(RenderError::resource(
                            resource(),
                            format!(
                                "@group({}) @binding({}) is used by {:?} but visible to {:?}",
                                b.group, b.binding, b.stages, slot.visibility
                            ),
                        ));
                    }
                }
            }
        }

        Ok(interface)
    }

    /// Validates, then creates the pipeline and its bind group layouts.
    pub fn build(self, device: &wgpu::Device) -> Result<Pipeline> {
        self.validate()?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&self.label),
            source: wgpu::ShaderSource::Wgsl(self.shader_source.into()),
        });

        let bind_group_layouts: Vec<wgpu::BindGroupLayout> = self
            .layout
            .groups()
            .iter()
            .map(|g| g.create(device))
            .collect();

        let pipeline_layout = match self.layout {
            PipelineLayout::Auto => None,
            PipelineLayout::Explicit(_) => {
                let refs: Vec<&wgpu::BindGroupLayout> = bind_group_layouts.iter().collect();
                Some(device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some(&self.label),
                    bind_group_layouts: &refs,
                    immediate_size: 0,
                }))
            }
        };

        let buffers: Vec<wgpu::VertexBufferLayout<'_>> =
            self.vertex_layouts.iter().map(VertexLayout::as_wgpu).collect();

        let raw = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&self.label),
            layout: pipeline_layout.as_ref(),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: &buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(FRAGMENT_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.format,
                    blend: self.blend.map(BlendMode::state),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: self.topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::info!(
            "built pipeline '{}' ({} vertex buffers, {} bind groups, blend {:?})",
            self.label,
            buffers.len(),
            bind_group_layouts.len(),
            self.blend
        );

        Ok(Pipeline {
            raw,
            bind_group_layouts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shaders;

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8UnormSrgb;

    fn pos() -> VertexLayout {
        VertexLayout::single(wgpu::VertexFormat::Float32x2, 0)
    }
    fn color() -> VertexLayout {
        VertexLayout::single(wgpu::VertexFormat::Float32x3, 1)
    }
    fn uv() -> VertexLayout {
        VertexLayout::single(wgpu::VertexFormat::Float32x2, 2)
    }

    fn textured_groups() -> PipelineLayout {
        PipelineLayout::Explicit(vec![
            BindGroupLayoutDesc::camera(),
            BindGroupLayoutDesc::texture(),
        ])
    }

    // ── blend ─────────────────────────────────────────────────────────────

    #[test]
    fn alpha_over_keeps_destination_alpha_out() {
        let s = BlendMode::AlphaOver.state();
        assert_eq!(s.color.src_factor, wgpu::BlendFactor::One);
        assert_eq!(s.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
        assert_eq!(s.alpha.src_factor, wgpu::BlendFactor::One);
        assert_eq!(s.alpha.dst_factor, wgpu::BlendFactor::Zero);
    }

    // ── vertex locations ──────────────────────────────────────────────────

    #[test]
    fn matching_layouts_validate() {
        let b = PipelineBuilder::new("tri", shaders::TRIANGLE, FORMAT).vertex_layouts(vec![pos()]);
        assert!(b.validate().is_ok());

        let b = PipelineBuilder::new("tex", shaders::TEXTURED, FORMAT)
            .vertex_layouts(vec![pos(), color(), uv()])
            .layout(textured_groups())
            .blend(Some(BlendMode::AlphaOver));
        assert!(b.validate().is_ok());
    }

    #[test]
    fn missing_location_fails() {
        let b = PipelineBuilder::new("tex", shaders::TEXTURED, FORMAT)
            .vertex_layouts(vec![pos(), color()])
            .layout(textured_groups());
        let err = b.validate().unwrap_err().to_string();
        assert!(err.contains("missing [2]"), "{err}");
    }

    #[test]
    fn extra_location_fails() {
        let b = PipelineBuilder::new("tri", shaders::TRIANGLE, FORMAT).vertex_layouts(vec![pos(), color()]);
        let err = b.validate().unwrap_err().to_string();
        assert!(err.contains("unused [1]"), "{err}");
    }

    #[test]
    fn shifted_location_fails() {
        let shifted = VertexLayout::single(wgpu::VertexFormat::Float32x2, 1);
        let b = PipelineBuilder::new("tri", shaders::TRIANGLE, FORMAT).vertex_layouts(vec![shifted]);
        assert!(b.validate().is_err());
    }

    #[test]
    fn integer_format_for_float_input_fails() {
        let ints = VertexLayout::single(wgpu::VertexFormat::Uint32x2, 0);
        let b = PipelineBuilder::new("tri", shaders::TRIANGLE, FORMAT).vertex_layouts(vec![ints]);
        let err = b.validate().unwrap_err();
        assert!(err.to_string().contains("Uint32x2"), "{err}");
    }

    #[test]
    fn normalized_format_feeds_float_input() {
        let unorm = VertexLayout::single(wgpu::VertexFormat::Unorm16x2, 0);
        let b = PipelineBuilder::new("tri", shaders::TRIANGLE, FORMAT).vertex_layouts(vec![unorm]);
        assert!(b.validate().is_ok());
    }

    #[test]
    fn duplicate_location_fails() {
        let b = PipelineBuilder::new("col", shaders::COLORED, FORMAT)
            .vertex_layouts(vec![pos(), color(), VertexLayout::single(wgpu::VertexFormat::Float32x3, 1)]);
        assert!(b.validate().is_err());
    }

    // ── layout mode ───────────────────────────────────────────────────────

    #[test]
    fn auto_layout_rejects_bound_shader() {
        let b = PipelineBuilder::new("tex", shaders::TEXTURED, FORMAT)
            .vertex_layouts(vec![pos(), color(), uv()]);
        let err = b.validate().unwrap_err().to_string();
        assert!(err.contains("explicit layout is required"), "{err}");
    }

    #[test]
    fn undeclared_group_fails() {
        let b = PipelineBuilder::new("tex", shaders::TEXTURED, FORMAT)
            .vertex_layouts(vec![pos(), color(), uv()])
            .layout(PipelineLayout::Explicit(vec![BindGroupLayoutDesc::camera()]));
        assert!(b.validate().is_err());
    }

    #[test]
    fn wrong_kind_fails() {
        // Groups swapped: the shader's camera uniform lands on a sampler slot.
        let b = PipelineBuilder::new("tex", shaders::TEXTURED, FORMAT)
            .vertex_layouts(vec![pos(), color(), uv()])
            .layout(PipelineLayout::Explicit(vec![
                BindGroupLayoutDesc::texture(),
                BindGroupLayoutDesc::camera(),
            ]));
        assert!(b.validate().is_err());
    }

    #[test]
    fn insufficient_visibility_fails() {
        let fragment_only_camera = BindGroupLayoutDesc::new("camera").with_slot(
            0,
            wgpu::ShaderStages::FRAGMENT,
            BindingKind::UniformBuffer,
        );
        let b = PipelineBuilder::new("tex", shaders::TEXTURED, FORMAT)
            .vertex_layouts(vec![pos(), color(), uv()])
            .layout(PipelineLayout::Explicit(vec![
                fragment_only_camera,
                BindGroupLayoutDesc::texture(),
            ]));
        let err = b.validate().unwrap_err().to_string();
        assert!(err.contains("visible to"), "{err}");
    }

    #[test]
    fn from_groups_selects_mode() {
        assert_eq!(PipelineLayout::from_groups(vec![]), PipelineLayout::Auto);
        assert!(matches!(
            PipelineLayout::from_groups(vec![BindGroupLayoutDesc::camera()]),
            PipelineLayout::Explicit(g) if g.len() == 1
        ));
    }
}
