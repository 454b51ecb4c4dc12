use super::{Geometry, VertexStream};

pub const POSITION_LOCATION: u32 = 0;
pub const COLOR_LOCATION: u32 = 1;
pub const UV_LOCATION: u32 = 2;

// Quad corners: bottom-left, bottom-right, top-right, top-left.
#[rustfmt::skip]
const QUAD_POSITIONS: [f32; 8] = [
    -0.5, -0.5,
     0.5, -0.5,
     0.5,  0.5,
    -0.5,  0.5,
];

// Image space has +V down, so the top edge samples v = 0.
#[rustfmt::skip]
const QUAD_UVS: [f32; 8] = [
    0.0, 1.0,
    1.0, 1.0,
    1.0, 0.0,
    0.0, 0.0,
];

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

impl Geometry {
    /// Single triangle, positions only.
    pub fn triangle() -> Self {
        #[rustfmt::skip]
        let positions = vec![
             0.0,  0.6,
            -0.6, -0.6,
             0.6, -0.6,
        ];
        Self::new(
            vec![VertexStream::new("triangle positions", POSITION_LOCATION, 2, positions)],
            None,
        )
    }

    /// Indexed quad with a color per corner.
    pub fn colored_quad() -> Self {
        #[rustfmt::skip]
        let colors = vec![
            1.0, 0.0, 0.0,
            0.0, 1.0, 0.0,
            0.0, 0.0, 1.0,
            1.0, 1.0, 0.0,
        ];
        Self::new(
            vec![
                VertexStream::new("quad positions", POSITION_LOCATION, 2, QUAD_POSITIONS.to_vec()),
                VertexStream::new("quad colors", COLOR_LOCATION, 3, colors),
            ],
            Some(QUAD_INDICES.to_vec()),
        )
    }

    /// Indexed quad with white vertex color and texture coordinates.
    pub fn textured_quad() -> Self {
        Self::new(
            vec![
                VertexStream::new("quad positions", POSITION_LOCATION, 2, QUAD_POSITIONS.to_vec()),
                VertexStream::new("quad colors", COLOR_LOCATION, 3, vec![1.0; 12]),
                VertexStream::new("quad uvs", UV_LOCATION, 2, QUAD_UVS.to_vec()),
            ],
            Some(QUAD_INDICES.to_vec()),
        )
    }
}
