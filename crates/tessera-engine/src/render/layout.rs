/// How the bytes of one vertex buffer map to shader input locations.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLayout {
    stride: u64,
    attributes: Vec<wgpu::VertexAttribute>,
}

impl VertexLayout {
    /// Empty layout with an explicit stride; add attributes with [`Self::with_attribute`].
    pub fn new(stride: u64) -> Self {
        Self {
            stride,
            attributes: Vec::new(),
        }
    }

    /// Tightly packed buffer holding a single attribute.
    pub fn single(format: wgpu::VertexFormat, location: u32) -> Self {
        Self::new(format.size()).with_attribute(format, 0, location)
    }

    pub fn with_attribute(mut self, format: wgpu::VertexFormat, offset: u64, location: u32) -> Self {
        self.attributes.push(wgpu::VertexAttribute {
            format,
            offset,
            shader_location: location,
        });
        self
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn attributes(&self) -> &[wgpu::VertexAttribute] {
        &self.attributes
    }

    pub fn locations(&self) -> impl Iterator<Item = u32> + '_ {
        self.attributes.iter().map(|a| a.shader_location)
    }

    /// Attributes that overrun the stride, if any.
    pub(crate) fn overflowing_attribute(&self) -> Option<&wgpu::VertexAttribute> {
        self.attributes
            .iter()
            .find(|a| a.offset + a.format.size() > self.stride)
    }

    pub fn as_wgpu(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }
}
