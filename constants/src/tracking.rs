/// Per-cycle blend toward the neutral pose while no face is visible
pub const NEUTRAL_DECAY_RATE: f32 = 0.05;

/// Viewing distance (decimetres) at which a face spans the reference width ratio
pub const DEFAULT_REFERENCE_DISTANCE: f32 = 6.0;

/// Face box width as a fraction of frame width at the reference distance
pub const DEFAULT_REFERENCE_FACE_WIDTH_RATIO: f32 = 0.25;

/// Depth clamp for the head estimate (decimetres)
pub const DEFAULT_MIN_Z: f32 = 1.0;
pub const DEFAULT_MAX_Z: f32 = 30.0;

/// Exponential smoothing factor, (0, 1]; 1 disables smoothing
pub const DEFAULT_SMOOTHING_FACTOR: f32 = 0.75;

/// Detection cycle rate limits (detections per second)
pub const DEFAULT_MAX_DETECTION_FPS: u32 = 30;
pub const MIN_DETECTION_FPS: u32 = 1;
pub const MAX_DETECTION_FPS: u32 = 60;

/// Requested capture resolution (long edge, pixels) handed to the detector
pub const DEFAULT_INPUT_SIZE: u32 = 320;
pub const MIN_INPUT_SIZE: u32 = 160;
pub const MAX_INPUT_SIZE: u32 = 1920;

/// Detections below this confidence are treated as "no face"
pub const MIN_DETECTION_CONFIDENCE: f32 = 0.5;

/// Default per-axis sensitivities (lateral in decimetres at full frame extent)
pub const DEFAULT_SENSITIVITY_X: f32 = 3.0;
pub const DEFAULT_SENSITIVITY_Y: f32 = 3.0;
pub const DEFAULT_SENSITIVITY_Z: f32 = 1.0;

/// Webcam mounting offset from the screen centre (centimetres)
pub const DEFAULT_OFFSET_X_CM: f32 = 0.0;
pub const DEFAULT_OFFSET_Y_CM: f32 = 4.0;

/// Minimum interval between outgoing head_update notifications (seconds)
pub const HEAD_UPDATE_INTERVAL_SECS: f32 = 0.1;
