use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use constants::display::CENTIMETRES_PER_UNIT;
use constants::tracking::NEUTRAL_DECAY_RATE;

use super::detection::DetectionBox;
use crate::engine::settings::ViewerSettings;

/// Smoothed head position in world units (decimetres) relative to the screen centre.
/// `z` is the distance in front of the screen plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl HeadState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Centred head at the resting viewing distance.
    pub fn neutral(settings: &ViewerSettings) -> Self {
        Self::new(0.0, 0.0, settings.reference_distance())
    }

    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn is_finite(&self) -> bool {
        self.as_vec3().is_finite()
    }

    /// Single-pole blend toward `target`.
    pub fn blend(self, target: HeadState, factor: f32) -> Self {
        if factor >= 1.0 {
            return target;
        }
        Self::new(
            self.x + (target.x - self.x) * factor,
            self.y + (target.y - self.y) * factor,
            self.z + (target.z - self.z) * factor,
        )
    }
}

/// Why a detection was refused at the estimator boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    EmptyFrame,
    EmptyBox,
    NonFinite,
}

impl RejectReason {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::EmptyFrame => "frame has zero width or height",
            Self::EmptyBox => "detection box has zero width or height",
            Self::NonFinite => "detection contains non-finite values",
        }
    }
}

/// Result of one estimator cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimateOutcome {
    Updated,
    Decayed,
    Rejected(RejectReason),
}

/// Mirror-corrected face centre in `[-1, 1]` on both axes, world Y up.
pub fn normalised_centre(bbox: &DetectionBox, frame_size: Vec2, mirror: bool) -> Vec2 {
    let centre = bbox.centre();
    let x = (centre.x / frame_size.x) * 2.0 - 1.0;
    let y = (centre.y / frame_size.y) * 2.0 - 1.0;
    Vec2::new(if mirror { -x } else { x }, -y)
}

/// Pinhole depth from the apparent face width, clamped to the configured range.
pub fn estimate_depth(observed_width_ratio: f32, settings: &ViewerSettings) -> f32 {
    let (min_z, max_z) = settings.depth_range();
    if !(observed_width_ratio.is_finite() && observed_width_ratio > 0.0) {
        return settings.reference_distance();
    }
    let depth = settings.reference_distance()
        * settings.sensitivity_z
        * settings.reference_face_width_ratio()
        / observed_width_ratio;
    if depth.is_finite() {
        depth.clamp(min_z, max_z)
    } else {
        max_z
    }
}

/// Unsmoothed head position for one detection.
pub fn raw_estimate(
    bbox: &DetectionBox,
    frame_size: Vec2,
    settings: &ViewerSettings,
) -> Result<HeadState, RejectReason> {
    if !bbox.is_finite() || !frame_size.is_finite() {
        return Err(RejectReason::NonFinite);
    }
    if frame_size.x <= 0.0 || frame_size.y <= 0.0 {
        return Err(RejectReason::EmptyFrame);
    }
    if bbox.width <= 0.0 || bbox.height <= 0.0 {
        return Err(RejectReason::EmptyBox);
    }

    let centre = normalised_centre(bbox, frame_size, settings.mirror_horizontal);
    let z = estimate_depth(bbox.width / frame_size.x, settings);

    // Lateral offsets grow with distance for the same pixel displacement.
    let depth_scale = z / settings.reference_distance();
    let x = centre.x * settings.sensitivity_x * depth_scale
        + settings.offset_x_cm / CENTIMETRES_PER_UNIT;
    let y = centre.y * settings.sensitivity_y * depth_scale
        + settings.offset_y_cm / CENTIMETRES_PER_UNIT;

    let raw = HeadState::new(x, y, z);
    if raw.is_finite() {
        Ok(raw)
    } else {
        Err(RejectReason::NonFinite)
    }
}

/// Owner of the session's single `HeadState`. Only the detection cycle writes to it.
#[derive(Resource, Debug, Clone)]
pub struct HeadPoseEstimator {
    state: HeadState,
}

impl HeadPoseEstimator {
    pub fn new(initial: HeadState) -> Self {
        Self { state: initial }
    }

    pub fn state(&self) -> HeadState {
        self.state
    }

    /// Advance one detection cycle. `None` decays toward the neutral pose; a
    /// rejected detection leaves the state untouched.
    pub fn update(
        &mut self,
        detection: Option<&DetectionBox>,
        frame_size: Vec2,
        settings: &ViewerSettings,
    ) -> EstimateOutcome {
        let (min_z, max_z) = settings.depth_range();

        let outcome = match detection {
            None => {
                self.state = self
                    .state
                    .blend(HeadState::neutral(settings), NEUTRAL_DECAY_RATE);
                EstimateOutcome::Decayed
            }
            Some(bbox) => match raw_estimate(bbox, frame_size, settings) {
                Ok(raw) => {
                    self.state = self.state.blend(raw, settings.effective_smoothing());
                    EstimateOutcome::Updated
                }
                Err(reason) => return EstimateOutcome::Rejected(reason),
            },
        };

        // Keeps the invariant when the clamp range shrinks between cycles.
        self.state.z = self.state.z.clamp(min_z, max_z);
        outcome
    }

    /// Snap back to the neutral pose.
    pub fn reset(&mut self, settings: &ViewerSettings) {
        self.state = HeadState::neutral(settings);
    }
}

impl Default for HeadPoseEstimator {
    fn default() -> Self {
        Self::new(HeadState::neutral(&ViewerSettings::default()))
    }
}
