/// Avatar translation speed (world units per second)
pub const MOVE_SPEED: f32 = 4.0;

/// Avatar yaw/pitch speed (radians per second)
pub const TURN_SPEED: f32 = 1.2;

/// Pitch clamp to keep the avatar from flipping over
pub const PITCH_LIMIT: f32 = 1.55;
