use bevy::color::Color;

/// Demo scene proxy planes
pub const FLOOR_Y: f32 = -4.0;
pub const WALL_Z: f32 = -8.0;
pub const WALL_CENTRE_Y: f32 = 6.0;
pub const GRID_EXTENT: f32 = 20.0;
pub const GRID_DIVISIONS: u32 = 20;

pub const FLOOR_GRID_COLOUR: Color = Color::srgb(0.0, 1.0, 1.0);
pub const WALL_GRID_COLOUR: Color = Color::srgb(1.0, 0.0, 1.0);
pub const HIT_MARKER_COLOUR: Color = Color::srgb(1.0, 0.0, 0.0);
pub const HIT_MARKER_RADIUS: f32 = 0.05;

/// Fog defaults (world units)
pub const DEFAULT_FOG_NEAR: f32 = 5.0;
pub const DEFAULT_FOG_FAR: f32 = 20.0;

/// Light defaults
pub const DEFAULT_LIGHT_POSITION: [f32; 3] = [5.0, 5.0, 5.0];
pub const DEFAULT_LIGHT_INTENSITY: f32 = 1.0;
pub const LIGHT_INTENSITY_SCALE: f32 = 200_000.0;
pub const DEFAULT_LIGHT_COLOUR: &str = "#ffffff";
