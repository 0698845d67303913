use bevy::asset::LoadState;
use bevy::prelude::*;

use crate::engine::core::app_state::{AppState, transition_to_running};
use crate::engine::settings::{SettingsChanged, SettingsPatch, ViewerSettings, update_settings};

/// Asset path of the start-up configuration, relative to `assets/`.
pub const SETTINGS_PATH: &str = "viewer_settings.json";

#[derive(Resource, Default)]
pub struct SettingsLoader {
    handle: Option<Handle<ViewerSettings>>,
}

pub fn start_loading(mut loader: ResMut<SettingsLoader>, asset_server: Res<AssetServer>) {
    loader.handle = Some(asset_server.load(SETTINGS_PATH));
}

/// Install the loaded settings, or keep the defaults if the file is missing or malformed.
/// File values go through `update_settings` so dependants see a `SettingsChanged`.
pub fn apply_loaded_settings(
    loader: Res<SettingsLoader>,
    asset_server: Res<AssetServer>,
    loaded: Res<Assets<ViewerSettings>>,
    mut settings: ResMut<ViewerSettings>,
    mut changes: EventWriter<SettingsChanged>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    let Some(handle) = loader.handle.as_ref() else {
        return;
    };

    if let Some(file_settings) = loaded.get(handle) {
        let patch = SettingsPatch::from(file_settings.clone());
        match update_settings(&mut settings, patch, &mut changes) {
            Ok(_) => println!("✓ Viewer settings loaded from {}", SETTINGS_PATH),
            Err(e) => warn!("Rejected {} ({}), using built-in defaults", SETTINGS_PATH, e),
        }
        transition_to_running(&mut next_state);
    } else if let Some(LoadState::Failed(error)) = asset_server.get_load_state(handle) {
        warn!(
            "Could not load {} ({}), using built-in defaults",
            SETTINGS_PATH, error
        );
        transition_to_running(&mut next_state);
    }
}

#[cfg(test)]
mod tests {
    use bevy::state::app::StatesPlugin;

    use super::*;

    #[test]
    fn loaded_file_publishes_its_changes() {
        let loaded = ViewerSettings {
            input_size: 256,
            max_detection_fps: 15,
            ..default()
        };

        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default(), StatesPlugin))
            .init_asset::<ViewerSettings>()
            .init_state::<AppState>()
            .add_event::<SettingsChanged>()
            .init_resource::<ViewerSettings>()
            .add_systems(Update, apply_loaded_settings);
        let handle = app
            .world_mut()
            .resource_mut::<Assets<ViewerSettings>>()
            .add(loaded.clone());
        app.insert_resource(SettingsLoader {
            handle: Some(handle),
        });

        app.update();

        assert_eq!(*app.world().resource::<ViewerSettings>(), loaded);
        let events = app.world().resource::<Events<SettingsChanged>>();
        let published: Vec<_> = events.iter_current_update_events().collect();
        assert_eq!(published.len(), 1);
        assert!(published[0].touches("input_size"));
        assert!(published[0].touches("max_detection_fps"));
    }
}
