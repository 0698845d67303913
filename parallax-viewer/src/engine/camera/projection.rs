use bevy::math::Vec3A;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use constants::display::{
    DECIMETRES_PER_INCH, DEFAULT_PPI, FALLBACK_VIEWPORT_HEIGHT, FALLBACK_VIEWPORT_WIDTH,
    MIN_EYE_DEPTH,
};

use crate::engine::settings::ViewerSettings;
use crate::tracking::head_pose::HeadState;
use crate::{Result, ViewerError};

/// Projection algorithm applied to the head-tracked camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    /// Frustum edges derived directly from the physical screen rectangle.
    #[default]
    WindowPhysical,
    /// Fixed field of view from the reference distance, shifted off-axis.
    WindowZoom,
    /// Symmetric frustum rotated toward a look-at point on the screen plane.
    VisualConvergence,
}

/// Pixel density of the physical display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenCalibration {
    pub ppi: f32,
}

impl Default for ScreenCalibration {
    fn default() -> Self {
        Self { ppi: DEFAULT_PPI }
    }
}

impl ScreenCalibration {
    pub fn effective_ppi(&self) -> f32 {
        if self.ppi.is_finite() && self.ppi > 0.0 {
            self.ppi
        } else {
            DEFAULT_PPI
        }
    }

    /// Physical screen size in world units (decimetres) for a viewport in logical pixels.
    pub fn screen_size(&self, viewport: Vec2) -> Vec2 {
        viewport / self.effective_ppi() * DECIMETRES_PER_INCH
    }
}

/// Near-plane rectangle of a (possibly asymmetric) perspective frustum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumBounds {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
}

impl FrustumBounds {
    /// Centred frustum for a vertical field of view.
    pub fn symmetric(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let top = near * (fov_y * 0.5).tan();
        let right = top * aspect;
        Self {
            left: -right,
            right,
            top,
            bottom: -top,
            near,
            far,
        }
    }

    /// Slide the near-plane window by `shift`, subtracted from both edges.
    pub fn shifted(self, shift: Vec2) -> Self {
        Self {
            left: self.left - shift.x,
            right: self.right - shift.x,
            top: self.top - shift.y,
            bottom: self.bottom - shift.y,
            ..self
        }
    }

    pub fn is_symmetric(&self) -> bool {
        self.left == -self.right && self.bottom == -self.top
    }

    pub fn is_finite(&self) -> bool {
        [self.left, self.right, self.top, self.bottom, self.near, self.far]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Reverse-Z clip matrix (near maps to depth 1, far to depth 0).
    pub fn clip_from_view(&self) -> Mat4 {
        let Self {
            left: l,
            right: r,
            top: t,
            bottom: b,
            near: n,
            far: f,
        } = *self;

        Mat4::from_cols(
            Vec4::new(2.0 * n / (r - l), 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 * n / (t - b), 0.0, 0.0),
            Vec4::new((r + l) / (r - l), (t + b) / (t - b), n / (f - n), -1.0),
            Vec4::new(0.0, 0.0, n * f / (f - n), 0.0),
        )
    }

    /// View-space corners at the two depths, each as bottom-right, top-right,
    /// top-left, bottom-left. Depths are negative view-space z values.
    pub fn corners(&self, z_near: f32, z_far: f32) -> [Vec3A; 8] {
        let at = |z: f32| {
            let scale = z.abs() / self.near;
            [
                Vec3A::new(self.right * scale, self.bottom * scale, z),
                Vec3A::new(self.right * scale, self.top * scale, z),
                Vec3A::new(self.left * scale, self.top * scale, z),
                Vec3A::new(self.left * scale, self.bottom * scale, z),
            ]
        };
        let [a, b, c, d] = at(z_near);
        let [e, f, g, h] = at(z_far);
        [a, b, c, d, e, f, g, h]
    }

    /// View-space direction through the centre of the near-plane window.
    pub fn centre_direction(&self) -> Vec3 {
        Vec3::new(
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
            -self.near,
        )
        .normalize_or(Vec3::NEG_Z)
    }
}

/// Camera pose and frustum for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionOutput {
    Window {
        eye: Vec3,
        frustum: FrustumBounds,
    },
    Convergence {
        eye: Vec3,
        look_at: Vec3,
        fov_y: f32,
        frustum: FrustumBounds,
    },
}

impl ProjectionOutput {
    pub fn frustum(&self) -> &FrustumBounds {
        match self {
            Self::Window { frustum, .. } | Self::Convergence { frustum, .. } => frustum,
        }
    }

    pub fn eye(&self) -> Vec3 {
        match self {
            Self::Window { eye, .. } | Self::Convergence { eye, .. } => *eye,
        }
    }

    /// Camera transform relative to the screen centre.
    pub fn camera_transform(&self) -> Transform {
        match self {
            Self::Window { eye, .. } => Transform::from_translation(*eye),
            Self::Convergence { eye, look_at, .. } => {
                Transform::from_translation(*eye).looking_at(*look_at, Vec3::Y)
            }
        }
    }
}

fn sanitise_viewport(viewport: Vec2) -> Vec2 {
    if viewport.is_finite() && viewport.x > 0.0 && viewport.y > 0.0 {
        viewport
    } else {
        Vec2::new(FALLBACK_VIEWPORT_WIDTH, FALLBACK_VIEWPORT_HEIGHT)
    }
}

/// Compute the camera pose and frustum for the given head position.
///
/// Units are decimetres with the origin at the screen centre and +z toward the
/// viewer. A non-finite head is refused so the caller can keep its previous
/// frame; every other degenerate input is corrected to a usable default.
pub fn compute_projection(
    head: HeadState,
    calibration: ScreenCalibration,
    mode: ProjectionMode,
    settings: &ViewerSettings,
    viewport: Vec2,
) -> Result<ProjectionOutput> {
    if !head.is_finite() {
        return Err(ViewerError::InvalidInput(format!(
            "head position is not finite: {:?}",
            head
        )));
    }

    let screen = calibration.screen_size(sanitise_viewport(viewport));
    let half = screen * 0.5;
    let (near, far) = settings.clip_planes();
    let eye = Vec3::new(head.x, head.y, head.z.max(MIN_EYE_DEPTH));

    let output = match mode {
        ProjectionMode::WindowPhysical => {
            let scale = near / eye.z;
            ProjectionOutput::Window {
                eye,
                frustum: FrustumBounds {
                    left: (-half.x - eye.x) * scale,
                    right: (half.x - eye.x) * scale,
                    top: (half.y - eye.y) * scale,
                    bottom: (-half.y - eye.y) * scale,
                    near,
                    far,
                },
            }
        }
        ProjectionMode::WindowZoom => {
            let base = half * (near / settings.reference_distance());
            let shift = eye.truncate() / eye.z * near;
            let frustum = FrustumBounds {
                left: -base.x,
                right: base.x,
                top: base.y,
                bottom: -base.y,
                near,
                far,
            }
            .shifted(shift);
            ProjectionOutput::Window { eye, frustum }
        }
        ProjectionMode::VisualConvergence => {
            let residual = 1.0 - settings.convergence();
            let depth = if settings.physics_mode {
                eye.z
            } else {
                settings.reference_distance()
            };
            let fov_y = 2.0 * (half.y / depth).atan();
            let aspect = screen.x / screen.y;
            let shift = eye.truncate() / eye.z * near * residual;
            ProjectionOutput::Convergence {
                eye,
                look_at: (eye.truncate() * residual).extend(0.0),
                fov_y,
                frustum: FrustumBounds::symmetric(fov_y, aspect, near, far).shifted(shift),
            }
        }
    };

    if output.frustum().is_finite() {
        Ok(output)
    } else {
        Err(ViewerError::InvalidInput(format!(
            "projection produced a non-finite frustum: {:?}",
            output.frustum()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const VIEWPORT: Vec2 = Vec2::new(1920.0, 1080.0);

    fn physical(head: HeadState) -> FrustumBounds {
        let settings = ViewerSettings::default();
        *compute_projection(
            head,
            settings.calibration(),
            ProjectionMode::WindowPhysical,
            &settings,
            VIEWPORT,
        )
        .unwrap()
        .frustum()
    }

    #[test]
    fn physical_window_is_symmetric_only_when_centred() {
        assert!(physical(HeadState::new(0.0, 0.0, 6.0)).is_symmetric());
        assert!(!physical(HeadState::new(0.5, 0.0, 6.0)).is_symmetric());
        assert!(!physical(HeadState::new(0.0, -0.3, 6.0)).is_symmetric());
    }

    #[test]
    fn physical_edges_follow_screen_rectangle() {
        let settings = ViewerSettings::default();
        let screen = settings.calibration().screen_size(VIEWPORT);
        let frustum = physical(HeadState::new(1.0, 0.5, 5.0));
        let scale = settings.clip_planes().0 / 5.0;

        assert_relative_eq!(frustum.left, (-screen.x / 2.0 - 1.0) * scale);
        assert_relative_eq!(frustum.right, (screen.x / 2.0 - 1.0) * scale);
        assert_relative_eq!(frustum.bottom, (-screen.y / 2.0 - 0.5) * scale);
        assert_relative_eq!(frustum.top, (screen.y / 2.0 - 0.5) * scale);
    }

    #[test]
    fn zero_ppi_falls_back_to_default_density() {
        let broken = ScreenCalibration { ppi: 0.0 };
        assert_eq!(broken.screen_size(VIEWPORT), ScreenCalibration::default().screen_size(VIEWPORT));
        assert_relative_eq!(ScreenCalibration::default().screen_size(Vec2::new(96.0, 96.0)).x, 0.254);
    }

    #[test]
    fn empty_viewport_and_zero_depth_stay_finite() {
        let settings = ViewerSettings::default();
        for mode in [
            ProjectionMode::WindowPhysical,
            ProjectionMode::WindowZoom,
            ProjectionMode::VisualConvergence,
        ] {
            let output = compute_projection(
                HeadState::new(0.2, 0.1, 0.0),
                ScreenCalibration { ppi: 0.0 },
                mode,
                &settings,
                Vec2::ZERO,
            )
            .unwrap();
            assert!(output.frustum().is_finite());
            assert_eq!(output.eye().z, MIN_EYE_DEPTH);
        }
    }

    #[test]
    fn non_finite_head_is_refused() {
        let settings = ViewerSettings::default();
        let result = compute_projection(
            HeadState::new(f32::NAN, 0.0, 6.0),
            settings.calibration(),
            ProjectionMode::WindowPhysical,
            &settings,
            VIEWPORT,
        );
        assert!(matches!(result, Err(ViewerError::InvalidInput(_))));
    }

    #[test]
    fn zoom_matches_physical_at_reference_distance() {
        let settings = ViewerSettings::default();
        let head = HeadState::new(0.8, -0.4, settings.reference_distance());
        let zoom = compute_projection(
            head,
            settings.calibration(),
            ProjectionMode::WindowZoom,
            &settings,
            VIEWPORT,
        )
        .unwrap();
        let phys = physical(head);

        assert_relative_eq!(zoom.frustum().left, phys.left, epsilon = 1e-6);
        assert_relative_eq!(zoom.frustum().top, phys.top, epsilon = 1e-6);
    }

    #[test]
    fn zoom_keeps_field_of_view_when_moving_closer() {
        let settings = ViewerSettings::default();
        let zoom = |z: f32| {
            *compute_projection(
                HeadState::new(0.0, 0.0, z),
                settings.calibration(),
                ProjectionMode::WindowZoom,
                &settings,
                VIEWPORT,
            )
            .unwrap()
            .frustum()
        };
        assert_eq!(zoom(2.0), zoom(12.0));
        assert_ne!(physical(HeadState::new(0.0, 0.0, 2.0)), physical(HeadState::new(0.0, 0.0, 12.0)));
    }

    #[test]
    fn mode_switch_changes_asymmetry_not_clip_planes() {
        let settings = ViewerSettings::default();
        let head = HeadState::new(1.5, 0.0, 3.0);
        let zoom = *compute_projection(
            head,
            settings.calibration(),
            ProjectionMode::WindowZoom,
            &settings,
            VIEWPORT,
        )
        .unwrap()
        .frustum();
        let phys = physical(head);

        assert_ne!(zoom.left, phys.left);
        assert_eq!((zoom.near, zoom.far), (phys.near, phys.far));
    }

    #[test]
    fn convergence_look_at_scales_with_residual() {
        let mut settings = ViewerSettings {
            visual_convergence_mode: true,
            convergence: 1.0,
            ..default()
        };
        let head = HeadState::new(2.0, 1.0, 6.0);
        let converge = |settings: &ViewerSettings| {
            compute_projection(
                head,
                settings.calibration(),
                settings.projection_mode(),
                settings,
                VIEWPORT,
            )
            .unwrap()
        };

        let ProjectionOutput::Convergence { look_at, frustum, .. } = converge(&settings) else {
            panic!("expected convergence output");
        };
        assert_eq!(look_at, Vec3::ZERO);
        assert!(frustum.is_symmetric());

        settings.convergence = 0.0;
        let ProjectionOutput::Convergence { look_at, frustum, .. } = converge(&settings) else {
            panic!("expected convergence output");
        };
        assert_eq!(look_at, Vec3::new(2.0, 1.0, 0.0));
        assert!(!frustum.is_symmetric());
    }

    #[test]
    fn convergence_fov_uses_reference_distance_without_physics() {
        let settings = ViewerSettings {
            visual_convergence_mode: true,
            physics_mode: false,
            ..default()
        };
        let screen = settings.calibration().screen_size(VIEWPORT);
        let output = compute_projection(
            HeadState::new(0.0, 0.0, 15.0),
            settings.calibration(),
            settings.projection_mode(),
            &settings,
            VIEWPORT,
        )
        .unwrap();
        let ProjectionOutput::Convergence { fov_y, .. } = output else {
            panic!("expected convergence output");
        };
        assert_relative_eq!(fov_y, 2.0 * (screen.y / 2.0 / settings.reference_distance()).atan());
    }

    #[test]
    fn clip_matrix_maps_near_to_one_and_far_to_zero() {
        let frustum = FrustumBounds {
            left: -0.3,
            right: 0.1,
            top: 0.2,
            bottom: -0.1,
            near: 0.1,
            far: 100.0,
        };
        let clip = frustum.clip_from_view();

        let near_corner = clip.project_point3(Vec3::new(0.1, 0.2, -0.1));
        assert_relative_eq!(near_corner.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(near_corner.y, 1.0, epsilon = 1e-5);
        assert_relative_eq!(near_corner.z, 1.0, epsilon = 1e-5);

        let far_corner = clip.project_point3(Vec3::new(-300.0, -100.0, -100.0));
        assert_relative_eq!(far_corner.x, -1.0, epsilon = 1e-4);
        assert_relative_eq!(far_corner.y, -1.0, epsilon = 1e-4);
        assert_relative_eq!(far_corner.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn corners_are_ordered_and_scaled_by_depth() {
        let frustum = FrustumBounds {
            left: -0.2,
            right: 0.4,
            top: 0.1,
            bottom: -0.3,
            near: 0.1,
            far: 10.0,
        };
        let corners = frustum.corners(-0.1, -1.0);

        assert_eq!(corners[0], Vec3A::new(0.4, -0.3, -0.1));
        assert_eq!(corners[1], Vec3A::new(0.4, 0.1, -0.1));
        assert_eq!(corners[2], Vec3A::new(-0.2, 0.1, -0.1));
        assert_eq!(corners[3], Vec3A::new(-0.2, -0.3, -0.1));
        assert_relative_eq!(corners[4].x, 4.0, epsilon = 1e-5);
        assert_relative_eq!(corners[6].y, 1.0, epsilon = 1e-5);
        assert_eq!(corners[7].z, -1.0);
    }
}
