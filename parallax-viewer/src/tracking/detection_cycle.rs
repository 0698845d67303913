use std::time::Duration;

use bevy::prelude::*;
use serde::Serialize;

use constants::tracking::{DEFAULT_MAX_DETECTION_FPS, MIN_DETECTION_CONFIDENCE};

use super::capture::CaptureSession;
use super::detection::{ActiveDetector, DetectionFeed, DetectorFrame};
use super::diagnostics::DiagnosticLatch;
use super::head_pose::{EstimateOutcome, HeadPoseEstimator, HeadState};
use crate::Result;
use crate::engine::settings::{SettingsChanged, ViewerSettings};

/// Rate limiter for detector polling, independent of the render frame rate.
#[derive(Resource, Debug)]
pub struct DetectionCycle {
    timer: Timer,
    rate: u32,
}

impl DetectionCycle {
    pub fn new(rate: u32) -> Self {
        let rate = rate.max(1);
        Self {
            timer: Timer::from_seconds(1.0 / rate as f32, TimerMode::Repeating),
            rate,
        }
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn set_rate(&mut self, rate: u32) {
        let rate = rate.max(1);
        if rate != self.rate {
            self.rate = rate;
            self.timer
                .set_duration(Duration::from_secs_f32(1.0 / rate as f32));
            self.timer.reset();
        }
    }

    /// Advance the timer. True when a detection is due this frame.
    pub fn tick(&mut self, delta: Duration) -> bool {
        self.timer.tick(delta).just_finished()
    }
}

impl Default for DetectionCycle {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DETECTION_FPS)
    }
}

/// Detector result polled this cycle and awaiting the estimator.
#[derive(Resource, Default)]
pub struct PendingDetection(pub Option<Result<DetectorFrame>>);

/// User-visible tracking state.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackingStatus {
    pub tracking_enabled: bool,
    pub face_visible: bool,
    pub message: String,
}

/// Published whenever the detection cycle moves the head state.
#[derive(Event, Debug, Clone, Copy)]
pub struct HeadUpdated {
    pub head: HeadState,
    pub outcome: EstimateOutcome,
}

/// Install the default detector, reset the head and open the camera.
pub fn start_tracking(
    mut commands: Commands,
    detector: Option<Res<ActiveDetector>>,
    feed: Res<DetectionFeed>,
    settings: Res<ViewerSettings>,
    mut estimator: ResMut<HeadPoseEstimator>,
    mut cycle: ResMut<DetectionCycle>,
    mut capture: ResMut<CaptureSession>,
) {
    if detector.is_none() {
        commands.insert_resource(ActiveDetector(Box::new(feed.clone())));
    }
    estimator.reset(&settings);
    cycle.set_rate(settings.detection_rate());
    capture.request(settings.capture_input_size());
    info!(
        "Head tracking started at up to {} detections per second",
        cycle.rate()
    );
}

/// Apply tracking-related settings changes.
pub fn sync_tracking_settings(
    mut changes: EventReader<SettingsChanged>,
    settings: Res<ViewerSettings>,
    mut cycle: ResMut<DetectionCycle>,
    mut capture: ResMut<CaptureSession>,
) {
    for change in changes.read() {
        if change.touches("max_detection_fps") {
            cycle.set_rate(settings.detection_rate());
        }
        if change.touches("input_size") && capture.input_size() != settings.capture_input_size() {
            capture.request(settings.capture_input_size());
        }
    }
}

/// Mirror the capture lifecycle into the status resource.
pub fn refresh_tracking_status(capture: Res<CaptureSession>, mut status: ResMut<TrackingStatus>) {
    if !capture.is_changed() {
        return;
    }
    let enabled = !capture.is_failed();
    let next = TrackingStatus {
        tracking_enabled: enabled,
        face_visible: enabled && status.face_visible,
        message: capture.status_message(),
    };
    if status.set_if_neq(next) {
        info!("Tracking status: {}", status.message);
    }
}

/// Non-blocking poll of the active detector on the cycle's schedule.
pub fn poll_detector(
    time: Res<Time>,
    mut cycle: ResMut<DetectionCycle>,
    detector: Option<ResMut<ActiveDetector>>,
    mut pending: ResMut<PendingDetection>,
) {
    if !cycle.tick(time.delta()) {
        return;
    }
    let Some(mut detector) = detector else {
        return;
    };
    // `None` leaves the previous result slot empty and the head untouched.
    pending.0 = detector.0.poll();
}

/// Feed the polled detection into the head estimator.
pub fn estimate_head_pose(
    mut pending: ResMut<PendingDetection>,
    capture: Res<CaptureSession>,
    settings: Res<ViewerSettings>,
    mut estimator: ResMut<HeadPoseEstimator>,
    mut status: ResMut<TrackingStatus>,
    mut updates: EventWriter<HeadUpdated>,
    mut latch: Local<DiagnosticLatch>,
) {
    let Some(polled) = pending.0.take() else {
        return;
    };

    let outcome = match polled {
        Ok(frame) => {
            if !capture.accepts(frame.generation) {
                debug!(
                    "Discarding detection from stale capture generation {}",
                    frame.generation
                );
                return;
            }
            let detection = frame.confident_box(MIN_DETECTION_CONFIDENCE);
            let frame_size = frame.frame_size_or(capture.frame_size());
            let outcome = estimator.update(detection.as_ref(), frame_size, &settings);
            if let EstimateOutcome::Rejected(reason) = outcome {
                if latch.report(reason.describe()) {
                    warn!("Ignoring detection: {}", reason.describe());
                }
                return;
            }
            if latch.clear() {
                info!("Detection input valid again");
            }
            outcome
        }
        Err(error) => {
            if latch.report(error.to_string()) {
                warn!("Face detector failed: {}", error);
            }
            estimator.update(None, Vec2::ZERO, &settings)
        }
    };

    let face_visible = outcome == EstimateOutcome::Updated;
    if status.face_visible != face_visible {
        status.face_visible = face_visible;
    }

    updates.write(HeadUpdated {
        head: estimator.state(),
        outcome,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_fires_at_configured_rate() {
        let mut cycle = DetectionCycle::new(10);
        let frame = Duration::from_millis(16);
        let fired = (0..60).filter(|_| cycle.tick(frame)).count();
        // 0.96 s of frames at 10 Hz
        assert_eq!(fired, 9);
    }

    #[test]
    fn rate_change_rebuilds_timer() {
        let mut cycle = DetectionCycle::new(30);
        cycle.set_rate(2);
        assert_eq!(cycle.rate(), 2);
        assert!(!cycle.tick(Duration::from_millis(400)));
        assert!(cycle.tick(Duration::from_millis(200)));
    }

    #[test]
    fn zero_rate_is_floored() {
        assert_eq!(DetectionCycle::new(0).rate(), 1);
    }
}
