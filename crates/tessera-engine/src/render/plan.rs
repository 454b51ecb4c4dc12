//! Per-frame render pass commands as data.
//!
//! A `FramePlan` is computed once from the validated configuration and
//! replayed by every `draw()`. Keeping it as data makes the command order
//! (pipeline, vertex buffers, index buffer, bind groups, one draw) checkable
//! without a device.

use crate::geometry::DrawCounts;

/// Linear clear color.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClearColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl ClearColor {
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r,
            g: self.g,
            b: self.b,
            a: self.a,
        }
    }
}

/// One command recorded inside the render pass.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameCommand {
    SetPipeline,
    SetVertexBuffer { slot: u32 },
    SetIndexBuffer,
    SetBindGroup { index: u32 },
    Draw { vertex_count: u32 },
    DrawIndexed { index_count: u32 },
}

/// Ordered command list for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub clear_color: ClearColor,
    pub commands: Vec<FrameCommand>,
}

impl FramePlan {
    /// Bind pipeline, vertex buffers `0..vertex_buffers`, the index buffer when
    /// `counts.indices` is set, bind groups `0..bind_groups`, then exactly one draw.
    pub fn new(clear_color: ClearColor, vertex_buffers: u32, bind_groups: u32, counts: DrawCounts) -> Self {
        let mut commands = vec![FrameCommand::SetPipeline];
        commands.extend((0..vertex_buffers).map(|slot| FrameCommand::SetVertexBuffer { slot }));
        if counts.indices.is_some() {
            commands.push(FrameCommand::SetIndexBuffer);
        }
        commands.extend((0..bind_groups).map(|index| FrameCommand::SetBindGroup { index }));
        commands.push(match counts.indices {
            Some(index_count) => FrameCommand::DrawIndexed { index_count },
            None => FrameCommand::Draw {
                vertex_count: counts.vertices,
            },
        });

        Self {
            clear_color,
            commands,
        }
    }

    /// Counts the plan submits per frame.
    pub fn stats(&self) -> FrameStats {
        let mut stats = FrameStats {
            clear_color: self.clear_color,
            draw_calls: 0,
            vertex_count: None,
            index_count: None,
            bind_groups: Vec::new(),
            frame_index: 0,
        };
        for cmd in &self.commands {
            match *cmd {
                FrameCommand::SetBindGroup { index } => stats.bind_groups.push(index),
                FrameCommand::Draw { vertex_count } => {
                    stats.draw_calls += 1;
                    stats.vertex_count = Some(vertex_count);
                }
                FrameCommand::DrawIndexed { index_count } => {
                    stats.draw_calls += 1;
                    stats.index_count = Some(index_count);
                }
                _ => {}
            }
        }
        stats
    }
}

/// What one submitted frame contained.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStats {
    pub clear_color: ClearColor,
    pub draw_calls: u32,
    /// Set for non-indexed draws.
    pub vertex_count: Option<u32>,
    /// Set for indexed draws.
    pub index_count: Option<u32>,
    /// Bind group indices in the order they were bound.
    pub bind_groups: Vec<u32>,
    pub frame_index: u64,
}

/// Result of one `draw()` call.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Presented(FrameStats),
    /// The surface timed out; nothing was encoded or submitted.
    Skipped,
}
