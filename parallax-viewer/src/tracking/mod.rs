//! Head tracking: camera stream lifecycle, face detection polling and the
//! smoothed head pose that drives the off-axis camera.

/// Scoped capture stream with generation tracking and a command outbox.
pub mod capture;

/// Detector abstraction, host-fed detection slot and scripted detector.
pub mod detection;

/// Rate-limited detection cycle feeding the head estimator.
pub mod detection_cycle;

/// Latch that logs a repeated diagnostic only once.
pub mod diagnostics;

/// Head position estimation from face bounding boxes.
pub mod head_pose;

/// Mouse-driven head simulation for native builds without a webcam.
#[cfg(not(target_arch = "wasm32"))]
pub mod pointer_detector;

use bevy::prelude::*;

use crate::engine::core::app_state::AppState;
use crate::engine::render::orchestrator::ViewerSet;
use capture::CaptureSession;
use detection::DetectionFeed;
use detection_cycle::{
    DetectionCycle, HeadUpdated, PendingDetection, TrackingStatus, estimate_head_pose,
    poll_detector, refresh_tracking_status, start_tracking, sync_tracking_settings,
};
use head_pose::HeadPoseEstimator;

pub struct TrackingPlugin;

impl Plugin for TrackingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CaptureSession>()
            .init_resource::<DetectionFeed>()
            .init_resource::<DetectionCycle>()
            .init_resource::<PendingDetection>()
            .init_resource::<HeadPoseEstimator>()
            .init_resource::<TrackingStatus>()
            .add_event::<HeadUpdated>()
            .add_systems(OnEnter(AppState::Running), start_tracking)
            .add_systems(
                Update,
                (
                    (sync_tracking_settings, refresh_tracking_status)
                        .chain()
                        .in_set(ViewerSet::Capture),
                    poll_detector.in_set(ViewerSet::Detect),
                    estimate_head_pose.in_set(ViewerSet::Estimate),
                )
                    .run_if(in_state(AppState::Running)),
            );

        #[cfg(not(target_arch = "wasm32"))]
        {
            use pointer_detector::{PointerHead, open_pointer_capture, simulate_head_from_pointer};

            app.init_resource::<PointerHead>().add_systems(
                Update,
                (open_pointer_capture, simulate_head_from_pointer)
                    .chain()
                    .before(sync_tracking_settings)
                    .in_set(ViewerSet::Capture)
                    .run_if(in_state(AppState::Running)),
            );
        }
    }
}
