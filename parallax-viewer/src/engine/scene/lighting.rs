use bevy::pbr::{DistanceFog, FogFalloff};
use bevy::prelude::*;

use constants::render_settings::LIGHT_INTENSITY_SCALE;

use crate::engine::camera::head_tracked_camera::{CurrentProjection, HeadTrackedCamera};
use crate::engine::locomotion::scene_root::SceneRoot;
use crate::engine::settings::ViewerSettings;

const FOG_COLOUR: Color = Color::srgb(0.02, 0.02, 0.04);

/// Point light that either rides with the eye or sits at a fixed scene position.
#[derive(Component)]
pub struct ViewerLight;

pub fn spawn_viewer_light(commands: &mut Commands, settings: &ViewerSettings) {
    commands.spawn((
        PointLight {
            intensity: settings.light_intensity * LIGHT_INTENSITY_SCALE,
            color: settings.light_colour(),
            range: settings.clip_planes().1,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_translation(Vec3::from(settings.light_position)),
        ViewerLight,
    ));
}

/// World position of the light for this frame.
pub fn light_position(
    settings: &ViewerSettings,
    eye: Option<Vec3>,
    scene_root: Option<&Transform>,
) -> Vec3 {
    match eye {
        Some(eye) if settings.light_follow_camera => eye,
        _ => {
            let fixed = Vec3::from(settings.light_position);
            // A fixed light belongs to the scene and moves with it.
            scene_root.map_or(fixed, |root| root.transform_point(fixed))
        }
    }
}

pub fn sync_viewer_light(
    settings: Res<ViewerSettings>,
    current: Res<CurrentProjection>,
    roots: Query<&Transform, (With<SceneRoot>, Without<ViewerLight>)>,
    mut lights: Query<(&mut PointLight, &mut Transform, &mut Visibility), With<ViewerLight>>,
) {
    let eye = current.0.map(|output| output.eye());
    let position = light_position(&settings, eye, roots.single().ok());

    for (mut light, mut transform, mut visibility) in &mut lights {
        transform.translation = position;
        visibility.set_if_neq(if settings.light_enabled {
            Visibility::Visible
        } else {
            Visibility::Hidden
        });

        if settings.is_changed() {
            light.intensity = settings.light_intensity.max(0.0) * LIGHT_INTENSITY_SCALE;
            light.color = settings.light_colour();
            light.range = settings.clip_planes().1;
        }
    }
}

pub fn atmosphere_fog(settings: &ViewerSettings) -> DistanceFog {
    let start = settings.fog_near.max(0.0);
    let end = settings.fog_far.max(start + f32::EPSILON);
    DistanceFog {
        color: FOG_COLOUR,
        falloff: FogFalloff::Linear { start, end },
        ..default()
    }
}

pub fn sync_atmosphere(
    mut commands: Commands,
    settings: Res<ViewerSettings>,
    cameras: Query<Entity, With<HeadTrackedCamera>>,
) {
    if !settings.is_changed() {
        return;
    }
    for camera in &cameras {
        commands.entity(camera).insert(atmosphere_fog(&settings));
    }
}
