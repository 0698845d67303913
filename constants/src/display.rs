/// Fallback pixel density when calibration is missing or invalid
pub const DEFAULT_PPI: f32 = 96.0;

/// One inch expressed in world units (decimetres)
pub const DECIMETRES_PER_INCH: f32 = 0.254;

/// Centimetres per world unit
pub const CENTIMETRES_PER_UNIT: f32 = 10.0;

/// Floor applied to the eye depth before it is used as a divisor
pub const MIN_EYE_DEPTH: f32 = 0.1;

/// Clip plane defaults, also used when configured planes are degenerate
pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 1000.0;

/// Viewport assumed before the window reports a usable size
pub const FALLBACK_VIEWPORT_WIDTH: f32 = 1920.0;
pub const FALLBACK_VIEWPORT_HEIGHT: f32 = 1080.0;

/// Default look-at convergence for the visual convergence mode
pub const DEFAULT_CONVERGENCE: f32 = 1.0;
