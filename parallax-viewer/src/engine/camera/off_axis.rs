use bevy::math::Vec3A;
use bevy::prelude::*;
use bevy::render::camera::{CameraProjection, SubCameraView};

use super::projection::FrustumBounds;

/// Custom camera projection holding an explicit asymmetric frustum.
///
/// Bevy's built-in perspective is always centred, so the head-tracked camera
/// installs this through `Projection::custom`. `update` is a no-op: the
/// frustum is recomputed from the head pose rather than from the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffAxisProjection {
    pub frustum: FrustumBounds,
}

impl OffAxisProjection {
    pub fn new(frustum: FrustumBounds) -> Self {
        Self { frustum }
    }

    /// Sub-rectangle of the frustum covered by a sub-view, or `None` when the
    /// full size is empty.
    pub fn sub_frustum(&self, sub_view: &SubCameraView) -> Option<FrustumBounds> {
        let full = sub_view.full_size.as_vec2();
        if full.x <= 0.0 || full.y <= 0.0 {
            return None;
        }
        let start = sub_view.offset / full;
        let end = (sub_view.offset + sub_view.size.as_vec2()) / full;

        let f = &self.frustum;
        let width = f.right - f.left;
        let height = f.top - f.bottom;
        // Sub-view offsets are measured from the top-left corner.
        Some(FrustumBounds {
            left: f.left + width * start.x,
            right: f.left + width * end.x,
            top: f.top - height * start.y,
            bottom: f.top - height * end.y,
            ..*f
        })
    }
}

impl CameraProjection for OffAxisProjection {
    fn get_clip_from_view(&self) -> Mat4 {
        self.frustum.clip_from_view()
    }

    fn get_clip_from_view_for_sub(&self, sub_view: &SubCameraView) -> Mat4 {
        self.sub_frustum(sub_view)
            .unwrap_or(self.frustum)
            .clip_from_view()
    }

    fn update(&mut self, _width: f32, _height: f32) {}

    fn far(&self) -> f32 {
        self.frustum.far
    }

    fn get_frustum_corners(&self, z_near: f32, z_far: f32) -> [Vec3A; 8] {
        self.frustum.corners(z_near, z_far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn projection() -> OffAxisProjection {
        OffAxisProjection::new(FrustumBounds {
            left: -0.4,
            right: 0.2,
            top: 0.3,
            bottom: -0.1,
            near: 0.1,
            far: 500.0,
        })
    }

    #[test]
    fn full_sub_view_matches_full_projection() {
        let projection = projection();
        let sub_view = SubCameraView {
            full_size: UVec2::new(800, 600),
            offset: Vec2::ZERO,
            size: UVec2::new(800, 600),
        };
        assert!(
            projection
                .get_clip_from_view_for_sub(&sub_view)
                .abs_diff_eq(projection.get_clip_from_view(), 1e-5)
        );
    }

    #[test]
    fn quadrant_sub_view_takes_top_left_of_window() {
        let sub_view = SubCameraView {
            full_size: UVec2::new(800, 600),
            offset: Vec2::ZERO,
            size: UVec2::new(400, 300),
        };
        let sub = projection().sub_frustum(&sub_view).unwrap();

        assert_relative_eq!(sub.left, -0.4, epsilon = 1e-6);
        assert_relative_eq!(sub.right, -0.1, epsilon = 1e-6);
        assert_relative_eq!(sub.top, 0.3, epsilon = 1e-6);
        assert_relative_eq!(sub.bottom, 0.1, epsilon = 1e-6);
        assert_eq!(sub.far, 500.0);
    }

    #[test]
    fn empty_sub_view_falls_back_to_full_frustum() {
        let projection = projection();
        let sub_view = SubCameraView {
            full_size: UVec2::ZERO,
            offset: Vec2::ZERO,
            size: UVec2::new(10, 10),
        };
        assert!(projection.sub_frustum(&sub_view).is_none());
        assert_eq!(
            projection.get_clip_from_view_for_sub(&sub_view),
            projection.get_clip_from_view()
        );
    }

    #[test]
    fn far_plane_is_finite() {
        assert_eq!(projection().far(), 500.0);
    }
}
