use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States, Resource)]
pub enum AppState {
    /// Waiting for `viewer_settings.json`.
    #[default]
    Loading,
    Running,
}

#[derive(Component)]
pub struct FpsText;

pub fn transition_to_running(next_state: &mut NextState<AppState>) {
    println!("→ Settings ready, transitioning to Running state");
    next_state.set(AppState::Running);
}
