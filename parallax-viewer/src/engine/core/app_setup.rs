use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;

// Crate engine modules
use crate::engine::camera::head_tracked_camera::HeadTrackedCamera;
use crate::engine::camera::off_axis::OffAxisProjection;
use crate::engine::camera::projection::compute_projection;
use crate::engine::core::app_state::{AppState, FpsText};
use crate::engine::core::window_config::create_window_config;
use crate::engine::loading::settings_loader::{SettingsLoader, apply_loaded_settings, start_loading};
use crate::engine::render::orchestrator::{ParallaxViewerPlugin, ViewerSet};
use crate::engine::scene::demo_scene::spawn_demo_scene;
use crate::engine::scene::lighting::{atmosphere_fog, spawn_viewer_light};
use crate::engine::settings::ViewerSettings;
use crate::engine::systems::fps_tracking::fps_notification_system;
use crate::engine::systems::head_readout::{
    head_update_notification_system, tracking_status_notification_system,
};
use crate::tracking::head_pose::HeadState;
// Create Web RPC modules
use crate::rpc::web_rpc::WebRpcPlugin;

#[cfg(not(target_arch = "wasm32"))]
use crate::engine::systems::{
    fps_tracking::fps_text_update_system,
    head_readout::{HeadReadoutText, head_readout_text_system},
    mode_shortcuts::handle_mode_shortcuts,
};

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .init_state::<AppState>()
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        // Registers ViewerSettings as a loadable asset type from JSON files.
        .add_plugins(JsonAssetPlugin::<ViewerSettings>::new(&["json"]))
        .add_plugins(ParallaxViewerPlugin)
        .add_plugins(WebRpcPlugin)
        .insert_resource(AmbientLight {
            color: Color::WHITE,
            brightness: 80.0,
            ..default()
        });

    // Initialise resources early
    app.init_resource::<ViewerSettings>()
        .init_resource::<SettingsLoader>();

    app.add_systems(Startup, (setup, start_loading).chain())
        .add_systems(
            Update,
            apply_loaded_settings.run_if(in_state(AppState::Loading)),
        );

    // Host notifications run on all platforms.
    app.add_systems(
        Update,
        (
            fps_notification_system,
            head_update_notification_system,
            tracking_status_notification_system,
        )
            .in_set(ViewerSet::Secondary)
            .run_if(in_state(AppState::Running)),
    );

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.add_systems(
            Update,
            (
                handle_mode_shortcuts.before(ViewerSet::Capture),
                (fps_text_update_system, head_readout_text_system).in_set(ViewerSet::Secondary),
            )
                .run_if(in_state(AppState::Running)),
        );
    }

    app
}

fn spawn_head_tracked_camera(commands: &mut Commands, settings: &ViewerSettings) {
    // Viewport is unknown until the window exists; the calculator falls back to 1920x1080.
    let initial = compute_projection(
        HeadState::neutral(settings),
        settings.calibration(),
        settings.projection_mode(),
        settings,
        Vec2::ZERO,
    );
    let (transform, projection) = match initial {
        Ok(output) => (
            output.camera_transform(),
            Projection::custom(OffAxisProjection::new(*output.frustum())),
        ),
        Err(e) => {
            warn!("Initial projection unavailable: {}", e);
            (
                Transform::from_xyz(0.0, 0.0, settings.reference_distance()),
                Projection::default(),
            )
        }
    };

    commands.spawn((
        Camera3d::default(),
        transform,
        projection,
        atmosphere_fog(settings),
        HeadTrackedCamera,
    ));
}

// Startup system that only handles basic initialisation
fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<ViewerSettings>,
) {
    spawn_head_tracked_camera(&mut commands, &settings);
    spawn_viewer_light(&mut commands, &settings);
    spawn_demo_scene(&mut commands, &mut meshes, &mut materials);

    #[cfg(not(target_arch = "wasm32"))]
    {
        create_native_overlays(&mut commands);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn create_native_overlays(commands: &mut Commands) {
    let overlay_font = TextFont {
        font_size: 16.0,
        ..default()
    };

    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new("FPS: "),
                overlay_font.clone(),
                TextColor(Color::srgb(1., 0., 0.)),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    right: Val::Px(12.0),
                    ..default()
                },
                FpsText,
            ));
            parent.spawn((
                Text::new("Head: waiting for camera"),
                overlay_font,
                TextColor(Color::srgb(0.8, 0.8, 0.8)),
                Node {
                    position_type: PositionType::Absolute,
                    top: Val::Px(12.0),
                    left: Val::Px(12.0),
                    ..default()
                },
                HeadReadoutText,
            ));
        });
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}
