//! WGSL shader interface reflection.
//!
//! Pipelines are checked against what the shader actually declares before the
//! device sees them, so layout mismatches surface during initialization as
//! `ResourceCreation` errors instead of device validation panics.

use std::collections::{BTreeMap, BTreeSet};

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, Handle, ScalarKind, ShaderStage, Type, TypeInner};

use crate::error::{RenderError, Result};

use super::bindings::BindingKind;

pub const VERTEX_ENTRY: &str = "vertexMain";
pub const FRAGMENT_ENTRY: &str = "fragmentMain";

/// A resource binding declared by the shader.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ShaderBinding {
    pub group: u32,
    pub binding: u32,
    /// `None` for resource kinds the pipeline builder does not model (storage buffers etc.).
    pub kind: Option<ShaderBindingKind>,
    /// Stages whose entry point statically uses the binding.
    pub stages: wgpu::ShaderStages,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderBindingKind {
    UniformBuffer,
    Texture,
    Sampler,
}

impl From<ShaderBindingKind> for BindingKind {
    fn from(k: ShaderBindingKind) -> Self {
        match k {
            ShaderBindingKind::UniformBuffer => BindingKind::UniformBuffer,
            ShaderBindingKind::Texture => BindingKind::Texture,
            ShaderBindingKind::Sampler => BindingKind::Sampler,
        }
    }
}

/// Numeric class shared by a vertex attribute format and the shader input it
/// feeds. Normalized and float formats both read as `Float`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum NumericClass {
    Float,
    Sint,
    Uint,
}

impl NumericClass {
    pub fn of_format(format: wgpu::VertexFormat) -> Self {
        use wgpu::VertexFormat as F;
        match format {
            F::Uint8 | F::Uint8x2 | F::Uint8x4 | F::Uint16 | F::Uint16x2 | F::Uint16x4 | F::Uint32
            | F::Uint32x2 | F::Uint32x3 | F::Uint32x4 => Self::Uint,
            F::Sint8 | F::Sint8x2 | F::Sint8x4 | F::Sint16 | F::Sint16x2 | F::Sint16x4 | F::Sint32
            | F::Sint32x2 | F::Sint32x3 | F::Sint32x4 => Self::Sint,
            _ => Self::Float,
        }
    }

    fn of_scalar(kind: ScalarKind) -> Option<Self> {
        match kind {
            ScalarKind::Float | ScalarKind::AbstractFloat => Some(Self::Float),
            ScalarKind::Sint | ScalarKind::AbstractInt => Some(Self::Sint),
            ScalarKind::Uint => Some(Self::Uint),
            ScalarKind::Bool => None,
        }
    }
}

/// What a shader module consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderInterface {
    /// Input locations of the vertex entry point with their numeric class.
    pub vertex_inputs: BTreeMap<u32, NumericClass>,
    /// Resource bindings of the whole module, sorted by `(group, binding)`.
    pub bindings: Vec<ShaderBinding>,
}

impl ShaderInterface {
    /// Parses `source` and reflects the `vertexMain`/`fragmentMain` interface.
    pub fn reflect(label: &str, source: &str) -> Result<Self> {
        let resource = || format!("shader '{label}'");

        let module = naga::front::wgsl::parse_str(source)
            .map_err(|e| RenderError::resource(resource(), e.emit_to_string(source)))?;

        let info = Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(&module)
            .map_err(|e| RenderError::resource(resource(), e.emit_to_string(source)))?;

        let find_entry = |name: &str, stage: ShaderStage| {
            module
                .entry_points
                .iter()
                .position(|ep| ep.name == name && ep.stage == stage)
                .ok_or_else(|| {
                    RenderError::resource(resource(), format!("missing {stage:?} entry point '{name}'"))
                })
        };

        let vertex_index = find_entry(VERTEX_ENTRY, ShaderStage::Vertex)?;
        let fragment_index = find_entry(FRAGMENT_ENTRY, ShaderStage::Fragment)?;
        let vertex = &module.entry_points[vertex_index];

        let class_of = |location: u32, ty: Handle<Type>| {
            let kind = match &module.types[ty].inner {
                TypeInner::Scalar(scalar) | TypeInner::Vector { scalar, .. } => Some(scalar.kind),
                _ => None,
            };
            kind.and_then(NumericClass::of_scalar).ok_or_else(|| {
                RenderError::resource(
                    resource(),
                    format!("vertex input @location({location}) is not a numeric scalar or vector"),
                )
            })
        };

        let mut vertex_inputs = BTreeMap::new();
        for arg in &vertex.function.arguments {
            match &arg.binding {
                Some(Binding::Location { location, .. }) => {
                    vertex_inputs.insert(*location, class_of(*location, arg.ty)?);
                }
                Some(Binding::BuiltIn(_)) => {}
                None => {
                    // Struct-typed argument: its members carry the bindings.
                    if let TypeInner::Struct { members, .. } = &module.types[arg.ty].inner {
                        for m in members {
                            if let Some(Binding::Location { location, .. }) = m.binding {
                                vertex_inputs.insert(location, class_of(location, m.ty)?);
                            }
                        }
                    }
                }
            }
        }

        let mut bindings: Vec<ShaderBinding> = module
            .global_variables
            .iter()
            .filter_map(|(handle, var)| {
                let rb = var.binding.as_ref()?;
                let kind = match (&var.space, &module.types[var.ty].inner) {
                    (AddressSpace::Uniform, _) => Some(ShaderBindingKind::UniformBuffer),
                    (AddressSpace::Handle, TypeInner::Image { .. }) => Some(ShaderBindingKind::Texture),
                    (AddressSpace::Handle, TypeInner::Sampler { .. }) => Some(ShaderBindingKind::Sampler),
                    _ => None,
                };
                let mut stages = wgpu::ShaderStages::NONE;
                if !info.get_entry_point(vertex_index)[handle].is_empty() {
                    stages |= wgpu::ShaderStages::VERTEX;
                }
                if !info.get_entry_point(fragment_index)[handle].is_empty() {
                    stages |= wgpu::ShaderStages::FRAGMENT;
                }
                Some(ShaderBinding {
                    group: rb.group,
                    binding: rb.binding,
                    kind,
                    stages,
                })
            })
            .collect();
        bindings.sort_by_key(|b| (b.group, b.binding));

        Ok(Self {
            vertex_inputs,
            bindings,
        })
    }

    /// Input locations of the vertex entry point.
    pub fn vertex_locations(&self) -> BTreeSet<u32> {
        self.vertex_inputs.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shaders;

    #[test]
    fn triangle_shader_interface() {
        let i = ShaderInterface::reflect("triangle", shaders::TRIANGLE).unwrap();
        assert_eq!(i.vertex_locations(), BTreeSet::from([0]));
        assert!(i.bindings.is_empty());
    }

    #[test]
    fn textured_shader_interface() {
        let i = ShaderInterface::reflect("textured", shaders::TEXTURED).unwrap();
        assert_eq!(i.vertex_locations(), BTreeSet::from([0, 1, 2]));

        let summary: Vec<_> = i
            .bindings
            .iter()
            .map(|b| (b.group, b.binding, b.kind, b.stages))
            .collect();
        assert_eq!(
            summary,
            vec![
                (0, 0, Some(ShaderBindingKind::UniformBuffer), wgpu::ShaderStages::VERTEX),
                (1, 0, Some(ShaderBindingKind::Sampler), wgpu::ShaderStages::FRAGMENT),
                (1, 1, Some(ShaderBindingKind::Texture), wgpu::ShaderStages::FRAGMENT),
            ]
        );
    }

    #[test]
    fn struct_inputs_are_reflected() {
        let src = r#"
            struct In {
                @location(0) pos: vec2f,
                @location(3) tint: vec4f,
            };
            @vertex fn vertexMain(v: In, @builtin(vertex_index) i: u32) -> @builtin(position) vec4f {
                return vec4f(v.pos, 0.0, 1.0) * v.tint;
            }
            @fragment fn fragmentMain() -> @location(0) vec4f { return vec4f(1.0); }
        "#;
        let i = ShaderInterface::reflect("struct", src).unwrap();
        assert_eq!(i.vertex_locations(), BTreeSet::from([0, 3]));
    }

    #[test]
    fn input_classes_follow_scalar_kind() {
        let src = r#"
            struct In {
                @location(0) pos: vec2f,
                @location(1) id: u32,
            };
            @vertex fn vertexMain(v: In, @location(2) offset: vec2i) -> @builtin(position) vec4f {
                return vec4f(v.pos + vec2f(offset) + f32(v.id), 0.0, 1.0);
            }
            @fragment fn fragmentMain() -> @location(0) vec4f { return vec4f(1.0); }
        "#;
        let i = ShaderInterface::reflect("classes", src).unwrap();
        assert_eq!(
            i.vertex_inputs,
            BTreeMap::from([
                (0, NumericClass::Float),
                (1, NumericClass::Uint),
                (2, NumericClass::Sint),
            ])
        );
    }

    #[test]
    fn format_classes() {
        assert_eq!(NumericClass::of_format(wgpu::VertexFormat::Float32x2), NumericClass::Float);
        assert_eq!(NumericClass::of_format(wgpu::VertexFormat::Unorm8x4), NumericClass::Float);
        assert_eq!(NumericClass::of_format(wgpu::VertexFormat::Uint32x2), NumericClass::Uint);
        assert_eq!(NumericClass::of_format(wgpu::VertexFormat::Sint16x4), NumericClass::Sint);
    }

    #[test]
    fn missing_entry_point_fails() {
        let src = r#"
            @vertex fn vs_main(@location(0) p: vec2f) -> @builtin(position) vec4f {
                return vec4f(p, 0.0, 1.0);
            }
            @fragment fn fragmentMain() -> @location(0) vec4f { return vec4f(1.0); }
        "#;
        let err = ShaderInterface::reflect("renamed", src).unwrap_err();
        assert!(err.to_string().contains("vertexMain"));
    }

    #[test]
    fn type_error_fails_validation() {
        let src = r#"
            @vertex fn vertexMain(@location(0) p: vec2f) -> @builtin(position) vec4f {
                return p;
            }
            @fragment fn fragmentMain() -> @location(0) vec4f { return vec4f(1.0); }
        "#;
        assert!(ShaderInterface::reflect("mistyped", src).is_err());
    }

    #[test]
    fn syntax_error_fails() {
        assert!(ShaderInterface::reflect("broken", "@vertex fn (").is_err());
    }
}
