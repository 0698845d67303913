use bevy::prelude::*;
use bevy::transform::TransformSystem;

use crate::engine::camera::head_tracked_camera::{
    CurrentProjection, apply_camera_projection, compute_camera_projection,
};
use crate::engine::core::app_state::AppState;
use crate::engine::locomotion::avatar::{AvatarPose, AvatarResetRequest, LocomotionSteps};
use crate::engine::locomotion::scene_root::{apply_scene_root, drive_avatar};
use crate::engine::scene::lighting::{sync_atmosphere, sync_viewer_light};
use crate::engine::scene::reticle::{ReticleHit, update_reticle};
use crate::engine::scene::demo_scene::animate_orbits;
use crate::engine::settings::SettingsChanged;
use crate::tracking::TrackingPlugin;

/// Per-frame pipeline stages, run in declaration order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerSet {
    /// Capture stream lifecycle and settings reactions.
    Capture,
    /// Non-blocking detector poll.
    Detect,
    /// Head pose update from the polled detection.
    Estimate,
    /// Keyboard avatar movement.
    Locomotion,
    /// Frustum and camera pose from the head pose.
    Project,
    /// Camera, projection and scene root writes.
    Apply,
    /// Light, fog, reticle and animation.
    Secondary,
}

/// Head-tracked viewer pipeline: tracking, projection, locomotion and the
/// view-dependent scene extras.
pub struct ParallaxViewerPlugin;

impl Plugin for ParallaxViewerPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (
                ViewerSet::Capture,
                ViewerSet::Detect,
                ViewerSet::Estimate,
                ViewerSet::Locomotion,
                ViewerSet::Project,
                ViewerSet::Apply,
                ViewerSet::Secondary,
            )
                .chain(),
        )
        .add_plugins(TrackingPlugin)
        .add_event::<SettingsChanged>()
        .add_event::<AvatarResetRequest>()
        .init_resource::<AvatarPose>()
        .init_resource::<LocomotionSteps>()
        .init_resource::<CurrentProjection>()
        .init_resource::<ReticleHit>()
        .add_systems(
            Update,
            (
                drive_avatar.in_set(ViewerSet::Locomotion),
                compute_camera_projection.in_set(ViewerSet::Project),
                (apply_camera_projection, apply_scene_root).in_set(ViewerSet::Apply),
                (sync_viewer_light, sync_atmosphere, animate_orbits)
                    .in_set(ViewerSet::Secondary),
            )
                .run_if(in_state(AppState::Running)),
        )
        // Ray-casts against proxies parented to the scene root, so it needs
        // this frame's propagated transforms.
        .add_systems(
            PostUpdate,
            update_reticle
                .after(TransformSystem::TransformPropagate)
                .run_if(in_state(AppState::Running)),
        );
    }
}
