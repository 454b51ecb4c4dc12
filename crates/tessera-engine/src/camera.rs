//! 2D orthographic camera.
//!
//! The camera maps a world-space window of `view_height` units (and the
//! matching width for the viewport aspect ratio) centered on `position` onto
//! clip space. The renderer only consumes the resulting matrix as raw floats.

use glam::{Mat4, Vec2};

/// Orthographic camera for 2D content.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    /// World-space point at the center of the viewport.
    pub position: Vec2,
    /// World units visible from the bottom to the top of the viewport.
    pub view_height: f32,
}

impl Default for Camera {
    /// Shows the clip-space square `[-1, 1]` vertically, aspect-corrected horizontally.
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            view_height: 2.0,
        }
    }
}

impl Camera {
    pub fn new(view_height: f32) -> Self {
        Self {
            view_height,
            ..Self::default()
        }
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Projection-view matrix for a `width`x`height` pixel viewport, column-major.
    ///
    /// Pure: equal inputs give bit-identical output. Zero dimensions are
    /// treated as one pixel.
    pub fn update(&self, width: u32, height: u32) -> [f32; 16] {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let half_h = (self.view_height * 0.5).max(f32::EPSILON);
        let half_w = half_h * aspect;

        let projection = Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, -1.0, 1.0);
        let view = Mat4::from_translation(-self.position.extend(0.0));

        (projection * view).to_cols_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn apply(m: [f32; 16], x: f32, y: f32) -> Vec4 {
        Mat4::from_cols_array(&m) * Vec4::new(x, y, 0.0, 1.0)
    }

    #[test]
    fn update_is_pure() {
        let cam = Camera::default().with_position(Vec2::new(0.25, -1.5));
        let a = cam.update(1280, 720);
        let b = cam.update(1280, 720);
        assert_eq!(a.map(f32::to_bits), b.map(f32::to_bits));
    }

    #[test]
    fn square_viewport_is_identity_on_xy() {
        let m = Camera::default().update(600, 600);
        let p = apply(m, 0.5, -0.5);
        assert!((p.x - 0.5).abs() < 1e-6);
        assert!((p.y + 0.5).abs() < 1e-6);
    }

    #[test]
    fn wide_viewport_compresses_x() {
        let m = Camera::default().update(800, 400);
        let p = apply(m, 1.0, 1.0);
        assert!((p.x - 0.5).abs() < 1e-6);
        assert!((p.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn position_is_centered() {
        let cam = Camera::default().with_position(Vec2::new(3.0, 2.0));
        let p = apply(cam.update(500, 500), 3.0, 2.0);
        assert!(p.x.abs() < 1e-6 && p.y.abs() < 1e-6);
    }

    #[test]
    fn zero_sized_viewport_stays_finite() {
        let m = Camera::default().update(0, 0);
        assert!(m.iter().all(|v| v.is_finite()));
    }
}
