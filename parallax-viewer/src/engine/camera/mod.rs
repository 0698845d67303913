//! Head-tracked off-axis camera.
//!
//! Turns the smoothed head position into a camera pose plus an asymmetric
//! frustum whose edges pass through the physical screen rectangle.

/// Projection modes, screen calibration and the frustum calculator.
pub mod projection;

/// `CameraProjection` implementation for explicit asymmetric frustums.
pub mod off_axis;

/// Camera marker and the systems that compute and apply the projection each frame.
pub mod head_tracked_camera;
