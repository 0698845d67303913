use bevy::prelude::*;

use super::avatar::{AvatarPose, AvatarResetRequest, LocomotionInput, LocomotionSteps};
use crate::engine::settings::ViewerSettings;

/// Parent of every world-space scene entity. Receives the inverse avatar transform.
#[derive(Component)]
pub struct SceneRoot;

/// Eye resting position, the point the avatar rotates around.
pub fn locomotion_pivot(settings: &ViewerSettings) -> Vec3 {
    Vec3::new(0.0, 0.0, settings.reference_distance())
}

pub fn drive_avatar(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    steps: Res<LocomotionSteps>,
    mut resets: EventReader<AvatarResetRequest>,
    mut pose: ResMut<AvatarPose>,
) {
    let mut input = LocomotionInput::from_keyboard(&keyboard);
    for reset in resets.read() {
        input.reset_position |= reset.position;
        input.reset_rotation |= reset.rotation;
    }
    if input.is_idle() {
        return;
    }
    pose.step(&input, &steps, time.delta_secs());
}

pub fn apply_scene_root(
    pose: Res<AvatarPose>,
    settings: Res<ViewerSettings>,
    mut roots: Query<&mut Transform, With<SceneRoot>>,
) {
    if !pose.is_changed() && !settings.is_changed() {
        return;
    }
    let transform = pose.scene_root_transform(locomotion_pivot(&settings));
    for mut root in &mut roots {
        *root = transform;
    }
}
