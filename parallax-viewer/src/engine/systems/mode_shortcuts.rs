use bevy::prelude::*;

use crate::engine::settings::{SettingsChanged, SettingsPatch, ViewerSettings, update_settings};

const CONVERGENCE_STEP: f32 = 0.1;

/// Settings change for the shortcut keys pressed this frame:
/// `P` physics mode, `V` convergence mode, `C` crosshair, `[`/`]` convergence.
pub fn shortcut_patch(keyboard: &ButtonInput<KeyCode>, settings: &ViewerSettings) -> Option<SettingsPatch> {
    let mut patch = SettingsPatch::default();

    if keyboard.just_pressed(KeyCode::KeyP) {
        patch.physics_mode = Some(!settings.physics_mode);
    }
    if keyboard.just_pressed(KeyCode::KeyV) {
        patch.visual_convergence_mode = Some(!settings.visual_convergence_mode);
    }
    if keyboard.just_pressed(KeyCode::KeyC) {
        patch.show_crosshair = Some(!settings.show_crosshair);
    }

    let mut convergence_delta = 0.0;
    if keyboard.just_pressed(KeyCode::BracketLeft) {
        convergence_delta -= CONVERGENCE_STEP;
    }
    if keyboard.just_pressed(KeyCode::BracketRight) {
        convergence_delta += CONVERGENCE_STEP;
    }
    if convergence_delta != 0.0 {
        patch.convergence = Some((settings.convergence() + convergence_delta).clamp(0.0, 1.0));
    }

    (patch != SettingsPatch::default()).then_some(patch)
}

pub fn handle_mode_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut settings: ResMut<ViewerSettings>,
    mut changes: EventWriter<SettingsChanged>,
) {
    let Some(patch) = shortcut_patch(&keyboard, &settings) else {
        return;
    };
    if let Err(e) = update_settings(&mut settings, patch, &mut changes) {
        warn!("Shortcut rejected: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pressed(keys: &[KeyCode]) -> ButtonInput<KeyCode> {
        let mut keyboard = ButtonInput::default();
        for key in keys {
            keyboard.press(*key);
        }
        keyboard
    }

    #[test]
    fn no_keys_no_patch() {
        assert!(shortcut_patch(&pressed(&[]), &ViewerSettings::default()).is_none());
    }

    #[test]
    fn toggles_flip_current_values() {
        let settings = ViewerSettings::default();
        let patch = shortcut_patch(&pressed(&[KeyCode::KeyP, KeyCode::KeyV]), &settings).unwrap();
        assert_eq!(patch.physics_mode, Some(!settings.physics_mode));
        assert_eq!(patch.visual_convergence_mode, Some(true));
        assert_eq!(patch.show_crosshair, None);
    }

    #[test]
    fn convergence_steps_are_clamped() {
        let settings = ViewerSettings {
            convergence: 1.0,
            ..default()
        };
        let up = shortcut_patch(&pressed(&[KeyCode::BracketRight]), &settings).unwrap();
        assert_eq!(up.convergence, Some(1.0));

        let down = shortcut_patch(&pressed(&[KeyCode::BracketLeft]), &settings).unwrap();
        assert!((down.convergence.unwrap() - 0.9).abs() < 1e-6);
    }
}
