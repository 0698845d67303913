use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::off_axis::OffAxisProjection;
use super::projection::{ProjectionOutput, compute_projection};
use crate::engine::settings::ViewerSettings;
use crate::tracking::diagnostics::DiagnosticLatch;
use crate::tracking::head_pose::HeadPoseEstimator;

/// The single camera whose pose and frustum follow the viewer's head.
#[derive(Component)]
pub struct HeadTrackedCamera;

/// Last successfully computed projection. Kept across frames where the
/// calculator refuses its input.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct CurrentProjection(pub Option<ProjectionOutput>);

pub fn compute_camera_projection(
    estimator: Res<HeadPoseEstimator>,
    settings: Res<ViewerSettings>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut current: ResMut<CurrentProjection>,
    mut latch: Local<DiagnosticLatch>,
) {
    let viewport = windows
        .single()
        .map(|window| window.size())
        .unwrap_or(Vec2::ZERO);

    match compute_projection(
        estimator.state(),
        settings.calibration(),
        settings.projection_mode(),
        &settings,
        viewport,
    ) {
        Ok(output) => {
            latch.clear();
            current.set_if_neq(CurrentProjection(Some(output)));
        }
        Err(error) => {
            if latch.report(error.to_string()) {
                warn!("Keeping previous projection: {}", error);
            }
        }
    }
}

pub fn apply_camera_projection(
    current: Res<CurrentProjection>,
    mut cameras: Query<(&mut Transform, &mut Projection), With<HeadTrackedCamera>>,
) {
    if !current.is_changed() {
        return;
    }
    let Some(output) = current.0 else {
        return;
    };

    for (mut transform, mut projection) in &mut cameras {
        *transform = output.camera_transform();
        *projection = Projection::custom(OffAxisProjection::new(*output.frustum()));
    }
}
