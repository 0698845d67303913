//! One frame at a time through the chained viewer stages: capture reactions,
//! rate-limited detector poll, head estimate, locomotion, projection and the
//! camera / scene-root writes.

use std::time::Duration;

use approx::assert_relative_eq;
use bevy::prelude::*;

use parallax_viewer::engine::camera::head_tracked_camera::{
    CurrentProjection, HeadTrackedCamera, apply_camera_projection, compute_camera_projection,
};
use parallax_viewer::engine::locomotion::avatar::{AvatarPose, AvatarResetRequest, LocomotionSteps};
use parallax_viewer::engine::locomotion::scene_root::{SceneRoot, apply_scene_root, drive_avatar};
use parallax_viewer::engine::render::orchestrator::ViewerSet;
use parallax_viewer::engine::settings::{SettingsChanged, ViewerSettings};
use parallax_viewer::tracking::capture::{CaptureCommand, CaptureSession};
use parallax_viewer::tracking::detection::{
    ActiveDetector, DetectionBox, DetectorFrame, FaceDetection, ScriptedDetector,
};
use parallax_viewer::tracking::detection_cycle::{
    DetectionCycle, HeadUpdated, PendingDetection, TrackingStatus, estimate_head_pose,
    poll_detector, sync_tracking_settings,
};
use parallax_viewer::tracking::head_pose::{HeadPoseEstimator, HeadState};

/// Frame step kept clear of the 10 Hz timer boundaries: polls land on steps 4 and 7.
const STEP: f32 = 0.03;
const RATE: u32 = 10;

fn face_frame(generation: u64) -> DetectorFrame {
    DetectorFrame {
        detection: Some(FaceDetection {
            bbox: DetectionBox::new(10.0, 80.0, 80.0, 80.0),
            confidence: 0.95,
        }),
        frame_width: 320.0,
        frame_height: 240.0,
        generation,
    }
}

/// Headless app running the chained stages against a scripted detector.
/// Returns the live capture generation.
fn frame_app(frames: usize) -> (App, u64) {
    let settings = ViewerSettings {
        max_detection_fps: RATE,
        ..default()
    };

    let mut capture = CaptureSession::default();
    let generation = capture.request(settings.capture_input_size());
    capture
        .on_opened(generation, 320, 240)
        .expect("current generation opens");
    capture.take_commands();

    let script = (0..frames).map(|_| Ok(face_frame(generation)));

    let mut app = App::new();
    app.configure_sets(
        Update,
        (
            ViewerSet::Capture,
            ViewerSet::Detect,
            ViewerSet::Estimate,
            ViewerSet::Locomotion,
            ViewerSet::Project,
            ViewerSet::Apply,
        )
            .chain(),
    )
    .add_event::<HeadUpdated>()
    .add_event::<SettingsChanged>()
    .add_event::<AvatarResetRequest>()
    .insert_resource(Time::<()>::default())
    .init_resource::<ButtonInput<KeyCode>>()
    .insert_resource(HeadPoseEstimator::new(HeadState::neutral(&settings)))
    .insert_resource(settings)
    .insert_resource(capture)
    .insert_resource(DetectionCycle::new(RATE))
    .insert_resource(ActiveDetector(Box::new(ScriptedDetector::new(script))))
    .init_resource::<PendingDetection>()
    .init_resource::<TrackingStatus>()
    .init_resource::<AvatarPose>()
    .init_resource::<LocomotionSteps>()
    .init_resource::<CurrentProjection>()
    .add_systems(
        Update,
        (
            sync_tracking_settings.in_set(ViewerSet::Capture),
            poll_detector.in_set(ViewerSet::Detect),
            estimate_head_pose.in_set(ViewerSet::Estimate),
            drive_avatar.in_set(ViewerSet::Locomotion),
            compute_camera_projection.in_set(ViewerSet::Project),
            (apply_camera_projection, apply_scene_root).in_set(ViewerSet::Apply),
        ),
    );

    app.world_mut()
        .spawn((HeadTrackedCamera, Transform::default(), Projection::default()));
    app.world_mut().spawn((SceneRoot, Transform::default()));
    (app, generation)
}

/// Advance the clock one step and run a frame. Returns the head updates it published.
fn step(app: &mut App) -> usize {
    app.world_mut()
        .resource_mut::<Time>()
        .advance_by(Duration::from_secs_f32(STEP));
    app.update();
    app.world()
        .resource::<Events<HeadUpdated>>()
        .iter_current_update_events()
        .count()
}

fn head(app: &App) -> HeadState {
    app.world().resource::<HeadPoseEstimator>().state()
}

fn camera(app: &mut App) -> (Transform, bool) {
    let mut query = app
        .world_mut()
        .query_filtered::<(&Transform, &Projection), With<HeadTrackedCamera>>();
    let (transform, projection) = query.single(app.world()).expect("one tracked camera");
    (*transform, matches!(projection, Projection::Custom(_)))
}

fn scene_root(app: &mut App) -> Transform {
    let mut query = app
        .world_mut()
        .query_filtered::<&Transform, With<SceneRoot>>();
    *query.single(app.world()).expect("one scene root")
}

#[test]
fn detector_is_polled_at_the_configured_rate() {
    let (mut app, _) = frame_app(10);

    let polls: Vec<usize> = (0..8).map(|_| step(&mut app)).collect();

    assert_eq!(polls, vec![0, 0, 0, 1, 0, 0, 1, 0]);
}

#[test]
fn detection_moves_the_camera_and_installs_the_off_axis_frustum() {
    let (mut app, _) = frame_app(1);

    step(&mut app);
    let (resting, custom) = camera(&mut app);
    assert!(custom);
    assert_relative_eq!(resting.translation.x, 0.0, epsilon = 1e-5);

    for _ in 0..3 {
        step(&mut app);
    }
    let state = head(&app);
    assert!(state.x > 0.0);

    let (moved, custom) = camera(&mut app);
    assert!(custom);
    let output = app
        .world()
        .resource::<CurrentProjection>()
        .0
        .expect("projection computed");
    assert_eq!(moved, output.camera_transform());
    assert_relative_eq!(moved.translation.x, state.x, epsilon = 1e-5);
    // Head to the right: the window opening extends further to the left.
    assert!(output.frustum().left.abs() > output.frustum().right.abs());
}

#[test]
fn exhausted_detector_keeps_the_previous_pose() {
    let (mut app, _) = frame_app(1);
    for _ in 0..4 {
        step(&mut app);
    }
    let tracked = head(&app);
    let (tracked_camera, _) = camera(&mut app);

    for _ in 0..12 {
        assert_eq!(step(&mut app), 0);
    }

    assert_eq!(head(&app), tracked);
    assert_eq!(camera(&mut app).0, tracked_camera);
}

#[test]
fn held_forward_key_moves_the_scene_root() {
    let (mut app, _) = frame_app(0);
    app.world_mut()
        .resource_mut::<ButtonInput<KeyCode>>()
        .press(KeyCode::KeyW);

    step(&mut app);
    step(&mut app);

    let pose = *app.world().resource::<AvatarPose>();
    let travelled = LocomotionSteps::default().move_speed * STEP * 2.0;
    assert_relative_eq!(pose.position.z, -travelled, epsilon = 1e-4);

    // Walking forward pulls the world toward the viewer.
    let root = scene_root(&mut app);
    assert_relative_eq!(root.translation.x, 0.0, epsilon = 1e-5);
    assert_relative_eq!(root.translation.z, travelled, epsilon = 1e-4);
    assert_eq!(root.rotation, Quat::IDENTITY);
}

#[test]
fn input_size_change_releases_then_reopens_the_stream() {
    let (mut app, generation) = frame_app(0);
    step(&mut app);

    app.world_mut().resource_mut::<ViewerSettings>().input_size = 256;
    app.world_mut().send_event(SettingsChanged {
        changed: vec!["input_size"],
    });
    step(&mut app);

    let commands = app
        .world_mut()
        .resource_mut::<CaptureSession>()
        .take_commands();
    assert_eq!(
        commands,
        vec![
            CaptureCommand::Release { generation },
            CaptureCommand::Open {
                generation: generation + 1,
                input_size: 256,
            },
        ]
    );
    assert!(!app.world().resource::<CaptureSession>().accepts(generation));
}
