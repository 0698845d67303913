use bevy::prelude::*;

use constants::tracking::HEAD_UPDATE_INTERVAL_SECS;

use crate::engine::camera::projection::ProjectionMode;
use crate::engine::settings::ViewerSettings;
use crate::rpc::web_rpc::WebRpcInterface;
use crate::tracking::detection_cycle::{HeadUpdated, TrackingStatus};
use crate::tracking::head_pose::{EstimateOutcome, HeadPoseEstimator, HeadState};

#[derive(Component)]
pub struct HeadReadoutText;

pub fn format_head_readout(head: HeadState, mode: ProjectionMode, status: &TrackingStatus) -> String {
    let face = if status.face_visible { "face" } else { "no face" };
    format!(
        "Head x: {:+.2} y: {:+.2} z: {:.2} dm | {:?} | {} | {}",
        head.x, head.y, head.z, mode, face, status.message
    )
}

pub fn head_readout_text_system(
    estimator: Res<HeadPoseEstimator>,
    settings: Res<ViewerSettings>,
    status: Res<TrackingStatus>,
    mut query: Query<&mut Text, With<HeadReadoutText>>,
) {
    if !estimator.is_changed() && !settings.is_changed() && !status.is_changed() {
        return;
    }
    let readout = format_head_readout(estimator.state(), settings.projection_mode(), &status);
    for mut text in &mut query {
        text.0.clone_from(&readout);
    }
}

/// Forward the newest head state to the host, at most every `HEAD_UPDATE_INTERVAL_SECS`.
/// An update that arrives while throttled is held and sent once the interval elapses.
pub fn head_update_notification_system(
    mut updates: EventReader<HeadUpdated>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut pending: Local<Option<HeadUpdated>>,
    mut last_send_time: Local<Option<f32>>,
    time: Res<Time>,
) {
    if let Some(latest) = updates.read().last() {
        *pending = Some(*latest);
    }
    let now = time.elapsed_secs();
    if last_send_time.is_some_and(|last| now - last < HEAD_UPDATE_INTERVAL_SECS) {
        return;
    }
    let Some(latest) = pending.take() else {
        return;
    };
    rpc_interface.send_notification(
        "head_update",
        serde_json::json!({
            "x": latest.head.x,
            "y": latest.head.y,
            "z": latest.head.z,
            "face_visible": latest.outcome == EstimateOutcome::Updated,
        }),
    );
    *last_send_time = Some(now);
}

pub fn tracking_status_notification_system(
    status: Res<TrackingStatus>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    if !status.is_changed() {
        return;
    }
    match serde_json::to_value(&*status) {
        Ok(params) => rpc_interface.send_notification("tracking_status", params),
        Err(e) => error!("Failed to serialise tracking status: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn notification_app() -> App {
        let mut app = App::new();
        app.add_event::<HeadUpdated>()
            .insert_resource(Time::<()>::default())
            .init_resource::<WebRpcInterface>()
            .add_systems(Update, head_update_notification_system);
        app
    }

    fn step(app: &mut App, secs: f32, head: Option<HeadState>) {
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(secs));
        if let Some(head) = head {
            app.world_mut().send_event(HeadUpdated {
                head,
                outcome: EstimateOutcome::Updated,
            });
        }
        app.update();
    }

    fn sent_x(app: &App) -> Vec<f64> {
        app.world()
            .resource::<WebRpcInterface>()
            .pending_notifications()
            .iter()
            .filter(|n| n.method == "head_update")
            .filter_map(|n| n.params["x"].as_f64())
            .collect()
    }

    #[test]
    fn throttled_update_is_sent_once_the_interval_elapses() {
        let mut app = notification_app();
        step(&mut app, 0.0, Some(HeadState::new(1.0, 0.0, 6.0)));
        step(&mut app, 0.03, Some(HeadState::new(2.0, 0.0, 6.0)));
        step(&mut app, 0.03, Some(HeadState::new(3.0, 0.0, 6.0)));
        assert_eq!(sent_x(&app), vec![1.0]);

        // No new detections: the held state still goes out.
        step(&mut app, 0.06, None);
        assert_eq!(sent_x(&app), vec![1.0, 3.0]);

        step(&mut app, 0.2, None);
        assert_eq!(sent_x(&app), vec![1.0, 3.0]);
    }

    #[test]
    fn readout_shows_position_mode_and_status() {
        let status = TrackingStatus {
            tracking_enabled: true,
            face_visible: false,
            message: "Camera active (320x240)".to_string(),
        };
        let text = format_head_readout(
            HeadState::new(0.5, -0.25, 6.0),
            ProjectionMode::WindowZoom,
            &status,
        );
        assert_eq!(
            text,
            "Head x: +0.50 y: -0.25 z: 6.00 dm | WindowZoom | no face | Camera active (320x240)"
        );
    }
}
