use crate::error::{RenderError, Result};
use crate::resources::{BufferUsage, GpuBuffer};

/// Resource kind a binding slot accepts.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BindingKind {
    UniformBuffer,
    /// Filterable float 2D texture.
    Texture,
    /// Filtering sampler.
    Sampler,
}

impl BindingKind {
    fn binding_type(self) -> wgpu::BindingType {
        match self {
            BindingKind::UniformBuffer => wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            BindingKind::Texture => wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            BindingKind::Sampler => wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        }
    }
}

/// One declared binding in a bind group layout.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BindingSlot {
    pub binding: u32,
    pub visibility: wgpu::ShaderStages,
    pub kind: BindingKind,
}

/// Declarative bind group layout. Group index is its position in the pipeline layout.
#[derive(Debug, Clone, PartialEq)]
pub struct BindGroupLayoutDesc {
    pub label: String,
    pub slots: Vec<BindingSlot>,
}

impl BindGroupLayoutDesc {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            slots: Vec::new(),
        }
    }

    pub fn with_slot(mut self, binding: u32, visibility: wgpu::ShaderStages, kind: BindingKind) -> Self {
        self.slots.push(BindingSlot {
            binding,
            visibility,
            kind,
        });
        self
    }

    /// Camera matrix uniform read by the vertex stage.
    pub fn camera() -> Self {
        Self::new("tessera camera bgl").with_slot(
            0,
            wgpu::ShaderStages::VERTEX,
            BindingKind::UniformBuffer,
        )
    }

    /// Sampler at binding 0 and texture at binding 1, read by the fragment stage.
    pub fn texture() -> Self {
        Self::new("tessera texture bgl")
            .with_slot(0, wgpu::ShaderStages::FRAGMENT, BindingKind::Sampler)
            .with_slot(1, wgpu::ShaderStages::FRAGMENT, BindingKind::Texture)
    }

    pub fn slot(&self, binding: u32) -> Option<&BindingSlot> {
        self.slots.iter().find(|s| s.binding == binding)
    }

    pub(crate) fn check(&self) -> Result<()> {
        for (i, s) in self.slots.iter().enumerate() {
            if self.slots[..i].iter().any(|o| o.binding == s.binding) {
                return Err(RenderError::resource(
                    format!("bind group layout '{}'", self.label),
                    format!("binding {} declared twice", s.binding),
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn create(&self, device: &wgpu::Device) -> wgpu::BindGroupLayout {
        let entries: Vec<wgpu::BindGroupLayoutEntry> = self
            .slots
            .iter()
            .map(|s| wgpu::BindGroupLayoutEntry {
                binding: s.binding,
                visibility: s.visibility,
                ty: s.kind.binding_type(),
                count: None,
            })
            .collect();

        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&self.label),
            entries: &entries,
        })
    }
}

/// A resource supplied for one binding slot.
#[derive(Debug, Copy, Clone)]
pub enum BoundResource<'a> {
    Buffer(&'a GpuBuffer),
    TextureView(&'a wgpu::TextureView),
    Sampler(&'a wgpu::Sampler),
}

impl<'a> BoundResource<'a> {
    /// Kind this resource satisfies, or `None` for a buffer that is not a uniform.
    fn kind(&self) -> Option<BindingKind> {
        match self {
            BoundResource::Buffer(b) if b.usage() == BufferUsage::Uniform => {
                Some(BindingKind::UniformBuffer)
            }
            BoundResource::Buffer(_) => None,
            BoundResource::TextureView(_) => Some(BindingKind::Texture),
            BoundResource::Sampler(_) => Some(BindingKind::Sampler),
        }
    }

    fn as_binding(&self) -> wgpu::BindingResource<'a> {
        match *self {
            BoundResource::Buffer(b) => b.as_binding(),
            BoundResource::TextureView(v) => wgpu::BindingResource::TextureView(v),
            BoundResource::Sampler(s) => wgpu::BindingResource::Sampler(s),
        }
    }
}

/// Collects resources for a bind group and checks them against its layout.
pub struct BindGroupBuilder<'a> {
    desc: &'a BindGroupLayoutDesc,
    entries: Vec<(u32, BoundResource<'a>)>,
}

impl<'a> BindGroupBuilder<'a> {
    pub fn new(desc: &'a BindGroupLayoutDesc) -> Self {
        Self {
            desc,
            entries: Vec::new(),
        }
    }

    pub fn bind(mut self, binding: u32, resource: BoundResource<'a>) -> Self {
        self.entries.push((binding, resource));
        self
    }

    /// Every declared slot must receive exactly one resource of its kind, and
    /// no resource may target an undeclared slot.
    pub fn check(&self) -> Result<()> {
        let resource = || format!("bind group '{}'", self.desc.label);

        for (binding, res) in &self.entries {
            let Some(slot) = self.desc.slot(*binding) else {
                return Err(RenderError::resource(
                    resource(),
                    format!("binding {binding} is not declared in the layout"),
                ));
            };
            if res.kind() != Some(slot.kind) {
                return Err(RenderError::resource(
                    resource(),
                    format!("binding {binding} expects {:?}, got {res:?}", slot.kind),
                ));
            }
        }

        for slot in &self.desc.slots {
            match self.entries.iter().filter(|(b, _)| *b == slot.binding).count() {
                1 => {}
                0 => {
                    return Err(RenderError::resource(
                        resource(),
                        format!("no resource supplied for binding {}", slot.binding),
                    ));
                }
                _ => {
                    return Err(RenderError::resource(
                        resource(),
                        format!("binding {} supplied more than once", slot.binding),
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn build(self, device: &wgpu::Device, layout: &wgpu::BindGroupLayout) -> Result<wgpu::BindGroup> {
        self.check()?;

        let entries: Vec<wgpu::BindGroupEntry<'_>> = self
            .entries
            .iter()
            .map(|(binding, res)| wgpu::BindGroupEntry {
                binding: *binding,
                resource: res.as_binding(),
            })
            .collect();

        Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&self.desc.label),
            layout,
            entries: &entries,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_well_formed() {
        assert!(BindGroupLayoutDesc::camera().check().is_ok());
        let tex = BindGroupLayoutDesc::texture();
        assert!(tex.check().is_ok());
        assert_eq!(tex.slot(0).map(|s| s.kind), Some(BindingKind::Sampler));
        assert_eq!(tex.slot(1).map(|s| s.kind), Some(BindingKind::Texture));
        assert!(tex.slot(2).is_none());
    }

    #[test]
    fn duplicate_binding_in_layout_is_rejected() {
        let desc = BindGroupLayoutDesc::new("dup")
            .with_slot(0, wgpu::ShaderStages::VERTEX, BindingKind::UniformBuffer)
            .with_slot(0, wgpu::ShaderStages::FRAGMENT, BindingKind::Sampler);
        assert!(desc.check().is_err());
    }

    #[test]
    fn missing_resource_is_rejected() {
        let desc = BindGroupLayoutDesc::camera();
        let err = BindGroupBuilder::new(&desc).check().unwrap_err();
        assert!(err.to_string().contains("no resource supplied for binding 0"));
    }
}
