//! Static geometry tables.
//!
//! Geometry is pure data: one `f32` stream per vertex attribute (each uploaded
//! to its own vertex buffer) plus optional `u16` indices. Coordinates are in
//! clip space unless a camera transforms them.

mod tables;

pub use tables::{COLOR_LOCATION, POSITION_LOCATION, UV_LOCATION};

use crate::error::{RenderError, Result};
use crate::render::VertexLayout;

/// One per-vertex attribute stream, bound to its own vertex buffer slot.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexStream {
    pub label: String,
    /// Shader input location the stream feeds.
    pub location: u32,
    /// Floats per vertex (1..=4).
    pub components: u32,
    pub data: Vec<f32>,
}

impl VertexStream {
    pub fn new(label: impl Into<String>, location: u32, components: u32, data: Vec<f32>) -> Self {
        Self {
            label: label.into(),
            location,
            components,
            data,
        }
    }

    pub fn format(&self) -> Option<wgpu::VertexFormat> {
        match self.components {
            1 => Some(wgpu::VertexFormat::Float32),
            2 => Some(wgpu::VertexFormat::Float32x2),
            3 => Some(wgpu::VertexFormat::Float32x3),
            4 => Some(wgpu::VertexFormat::Float32x4),
            _ => None,
        }
    }

    fn vertex_count(&self) -> Result<u32> {
        if self.format().is_none() {
            return Err(RenderError::resource(
                format!("vertex stream '{}'", self.label),
                format!("{} components per vertex is not a float vertex format", self.components),
            ));
        }
        if self.data.len() % self.components as usize != 0 {
            return Err(RenderError::resource(
                format!("vertex stream '{}'", self.label),
                format!(
                    "{} floats is not a multiple of {} components",
                    self.data.len(),
                    self.components
                ),
            ));
        }
        Ok((self.data.len() / self.components as usize) as u32)
    }

    /// Layout of this stream's buffer: one attribute at offset 0.
    pub fn layout(&self) -> Option<VertexLayout> {
        self.format()
            .map(|format| VertexLayout::single(format, self.location))
    }
}

/// Vertex and index counts of validated geometry.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DrawCounts {
    pub vertices: u32,
    pub indices: Option<u32>,
}

/// Vertex streams plus optional indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub streams: Vec<VertexStream>,
    pub indices: Option<Vec<u16>>,
}

impl Geometry {
    pub fn new(streams: Vec<VertexStream>, indices: Option<Vec<u16>>) -> Self {
        Self { streams, indices }
    }

    /// Checks stream shapes and index ranges and returns the draw counts.
    ///
    /// Fails on empty geometry, streams that disagree on vertex count, duplicate
    /// shader locations and out-of-range indices.
    pub fn validate(&self) -> Result<DrawCounts> {
        let resource = || "geometry".to_owned();

        let Some(first) = self.streams.first() else {
            return Err(RenderError::resource(resource(), "no vertex streams"));
        };
        let vertices = first.vertex_count()?;
        if vertices == 0 {
            return Err(RenderError::resource(resource(), "geometry has no vertices"));
        }

        let mut locations = Vec::with_capacity(self.streams.len());
        for s in &self.streams {
            let n = s.vertex_count()?;
            if n != vertices {
                return Err(RenderError::resource(
                    resource(),
                    format!(
                        "stream '{}' has {n} vertices, stream '{}' has {vertices}",
                        s.label, first.label
                    ),
                ));
            }
            if locations.contains(&s.location) {
                return Err(RenderError::resource(
                    resource(),
                    format!("shader location {} fed by more than one stream", s.location),
                ));
            }
            locations.push(s.location);
        }

        let indices = match &self.indices {
            None => None,
            Some(idx) if idx.is_empty() => {
                return Err(RenderError::resource(resource(), "index list is empty"));
            }
            Some(idx) => {
                if let Some(bad) = idx.iter().find(|&&i| u32::from(i) >= vertices) {
                    return Err(RenderError::resource(
                        resource(),
                        format!("index {bad} out of range for {vertices} vertices"),
                    ));
                }
                Some(idx.len() as u32)
            }
        };

        Ok(DrawCounts { vertices, indices })
    }

    /// Vertex buffer layouts in slot order.
    pub fn vertex_layouts(&self) -> Vec<VertexLayout> {
        self.streams.iter().filter_map(VertexStream::layout).collect()
    }
}
