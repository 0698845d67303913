use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use constants::display::{DEFAULT_CONVERGENCE, DEFAULT_FAR, DEFAULT_NEAR, DEFAULT_PPI};
use constants::render_settings::{
    DEFAULT_FOG_FAR, DEFAULT_FOG_NEAR, DEFAULT_LIGHT_COLOUR, DEFAULT_LIGHT_INTENSITY,
    DEFAULT_LIGHT_POSITION,
};
use constants::tracking::{
    DEFAULT_INPUT_SIZE, DEFAULT_MAX_DETECTION_FPS, DEFAULT_MAX_Z, DEFAULT_MIN_Z,
    DEFAULT_OFFSET_X_CM, DEFAULT_OFFSET_Y_CM, DEFAULT_REFERENCE_DISTANCE,
    DEFAULT_REFERENCE_FACE_WIDTH_RATIO, DEFAULT_SENSITIVITY_X, DEFAULT_SENSITIVITY_Y,
    DEFAULT_SENSITIVITY_Z, DEFAULT_SMOOTHING_FACTOR, MAX_DETECTION_FPS, MAX_INPUT_SIZE,
    MIN_DETECTION_FPS, MIN_INPUT_SIZE,
};

use crate::engine::camera::projection::{ProjectionMode, ScreenCalibration};
use crate::{Result, ViewerError};

/// Active viewer configuration shared by tracking, projection and locomotion.
///
/// Stored values are kept as the user entered them. Accessors sanitise on read so
/// a misconfigured field degrades to a safe default instead of a broken frustum.
#[derive(Resource, Asset, TypePath, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub sensitivity_x: f32,
    pub sensitivity_y: f32,
    pub sensitivity_z: f32,
    pub offset_x_cm: f32,
    pub offset_y_cm: f32,
    pub mirror_horizontal: bool,
    pub smoothing_factor: f32,
    pub stabilization: bool,
    pub physics_mode: bool,
    pub visual_convergence_mode: bool,
    pub convergence: f32,
    pub calibration_ppi: f32,
    pub reference_distance: f32,
    pub reference_face_width_ratio: f32,
    pub min_z: f32,
    pub max_z: f32,
    pub camera_near: f32,
    pub camera_far: f32,
    pub max_detection_fps: u32,
    pub input_size: u32,
    pub show_crosshair: bool,
    pub light_enabled: bool,
    pub light_follow_camera: bool,
    pub light_position: [f32; 3],
    pub light_intensity: f32,
    pub light_colour: String,
    pub fog_near: f32,
    pub fog_far: f32,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            sensitivity_x: DEFAULT_SENSITIVITY_X,
            sensitivity_y: DEFAULT_SENSITIVITY_Y,
            sensitivity_z: DEFAULT_SENSITIVITY_Z,
            offset_x_cm: DEFAULT_OFFSET_X_CM,
            offset_y_cm: DEFAULT_OFFSET_Y_CM,
            mirror_horizontal: true,
            smoothing_factor: DEFAULT_SMOOTHING_FACTOR,
            stabilization: true,
            physics_mode: true,
            visual_convergence_mode: false,
            convergence: DEFAULT_CONVERGENCE,
            calibration_ppi: DEFAULT_PPI,
            reference_distance: DEFAULT_REFERENCE_DISTANCE,
            reference_face_width_ratio: DEFAULT_REFERENCE_FACE_WIDTH_RATIO,
            min_z: DEFAULT_MIN_Z,
            max_z: DEFAULT_MAX_Z,
            camera_near: DEFAULT_NEAR,
            camera_far: DEFAULT_FAR,
            max_detection_fps: DEFAULT_MAX_DETECTION_FPS,
            input_size: DEFAULT_INPUT_SIZE,
            show_crosshair: true,
            light_enabled: true,
            light_follow_camera: true,
            light_position: DEFAULT_LIGHT_POSITION,
            light_intensity: DEFAULT_LIGHT_INTENSITY,
            light_colour: DEFAULT_LIGHT_COLOUR.to_string(),
            fog_near: DEFAULT_FOG_NEAR,
            fog_far: DEFAULT_FOG_FAR,
        }
    }
}

impl ViewerSettings {
    /// Projection algorithm selected by the mode flags. Convergence wins over physics.
    pub fn projection_mode(&self) -> ProjectionMode {
        if self.visual_convergence_mode {
            ProjectionMode::VisualConvergence
        } else if self.physics_mode {
            ProjectionMode::WindowPhysical
        } else {
            ProjectionMode::WindowZoom
        }
    }

    pub fn calibration(&self) -> ScreenCalibration {
        ScreenCalibration {
            ppi: self.calibration_ppi,
        }
    }

    /// Blend factor for the head estimator. Stabilisation off means instantaneous.
    pub fn effective_smoothing(&self) -> f32 {
        if !self.stabilization {
            return 1.0;
        }
        if self.smoothing_factor.is_finite() && self.smoothing_factor > 0.0 {
            self.smoothing_factor.min(1.0)
        } else {
            DEFAULT_SMOOTHING_FACTOR
        }
    }

    /// Near and far planes, replaced by defaults when degenerate.
    pub fn clip_planes(&self) -> (f32, f32) {
        let near = if self.camera_near.is_finite() && self.camera_near > 0.0 {
            self.camera_near
        } else {
            DEFAULT_NEAR
        };
        let far = if self.camera_far.is_finite() && self.camera_far > near {
            self.camera_far
        } else {
            DEFAULT_FAR.max(near * 2.0)
        };
        (near, far)
    }

    /// Depth clamp for the head estimate, always a non-empty positive range.
    pub fn depth_range(&self) -> (f32, f32) {
        let valid = self.min_z.is_finite()
            && self.max_z.is_finite()
            && self.min_z > 0.0
            && self.max_z > self.min_z;
        if valid {
            (self.min_z, self.max_z)
        } else {
            (DEFAULT_MIN_Z, DEFAULT_MAX_Z)
        }
    }

    /// Resting viewing distance, kept inside the depth clamp.
    pub fn reference_distance(&self) -> f32 {
        let (min_z, max_z) = self.depth_range();
        if self.reference_distance.is_finite() && self.reference_distance > 0.0 {
            self.reference_distance.clamp(min_z, max_z)
        } else {
            DEFAULT_REFERENCE_DISTANCE.clamp(min_z, max_z)
        }
    }

    pub fn reference_face_width_ratio(&self) -> f32 {
        if self.reference_face_width_ratio.is_finite() && self.reference_face_width_ratio > 0.0 {
            self.reference_face_width_ratio
        } else {
            DEFAULT_REFERENCE_FACE_WIDTH_RATIO
        }
    }

    pub fn convergence(&self) -> f32 {
        if self.convergence.is_finite() {
            self.convergence.clamp(0.0, 1.0)
        } else {
            DEFAULT_CONVERGENCE
        }
    }

    pub fn detection_rate(&self) -> u32 {
        self.max_detection_fps
            .clamp(MIN_DETECTION_FPS, MAX_DETECTION_FPS)
    }

    pub fn capture_input_size(&self) -> u32 {
        self.input_size.clamp(MIN_INPUT_SIZE, MAX_INPUT_SIZE)
    }

    /// Parsed light colour, white when the stored string is not a hex colour.
    pub fn light_colour(&self) -> Color {
        Srgba::hex(&self.light_colour)
            .map(Color::Srgba)
            .unwrap_or(Color::WHITE)
    }

    /// Merge a partial update. Returns the names of the fields that changed.
    pub fn apply(&mut self, patch: SettingsPatch) -> Result<Vec<&'static str>> {
        patch.validate()?;
        let mut changed = Vec::new();

        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(value) = patch.$field {
                        if self.$field != value {
                            self.$field = value;
                            changed.push(stringify!($field));
                        }
                    }
                )*
            };
        }

        merge!(
            sensitivity_x,
            sensitivity_y,
            sensitivity_z,
            offset_x_cm,
            offset_y_cm,
            mirror_horizontal,
            smoothing_factor,
            stabilization,
            physics_mode,
            visual_convergence_mode,
            convergence,
            calibration_ppi,
            reference_distance,
            reference_face_width_ratio,
            min_z,
            max_z,
            camera_near,
            camera_far,
            max_detection_fps,
            input_size,
            show_crosshair,
            light_enabled,
            light_follow_camera,
            light_position,
            light_intensity,
            light_colour,
            fog_near,
            fog_far,
        );

        Ok(changed)
    }
}

/// Partial settings update as sent by the configuration surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsPatch {
    pub sensitivity_x: Option<f32>,
    pub sensitivity_y: Option<f32>,
    pub sensitivity_z: Option<f32>,
    pub offset_x_cm: Option<f32>,
    pub offset_y_cm: Option<f32>,
    pub mirror_horizontal: Option<bool>,
    pub smoothing_factor: Option<f32>,
    pub stabilization: Option<bool>,
    pub physics_mode: Option<bool>,
    pub visual_convergence_mode: Option<bool>,
    pub convergence: Option<f32>,
    pub calibration_ppi: Option<f32>,
    pub reference_distance: Option<f32>,
    pub reference_face_width_ratio: Option<f32>,
    pub min_z: Option<f32>,
    pub max_z: Option<f32>,
    pub camera_near: Option<f32>,
    pub camera_far: Option<f32>,
    pub max_detection_fps: Option<u32>,
    pub input_size: Option<u32>,
    pub show_crosshair: Option<bool>,
    pub light_enabled: Option<bool>,
    pub light_follow_camera: Option<bool>,
    pub light_position: Option<[f32; 3]>,
    pub light_intensity: Option<f32>,
    pub light_colour: Option<String>,
    pub fog_near: Option<f32>,
    pub fog_far: Option<f32>,
}

impl SettingsPatch {
    /// Reject non-finite numbers before they reach the active configuration.
    fn validate(&self) -> Result<()> {
        let scalars = [
            ("sensitivity_x", self.sensitivity_x),
            ("sensitivity_y", self.sensitivity_y),
            ("sensitivity_z", self.sensitivity_z),
            ("offset_x_cm", self.offset_x_cm),
            ("offset_y_cm", self.offset_y_cm),
            ("smoothing_factor", self.smoothing_factor),
            ("convergence", self.convergence),
            ("calibration_ppi", self.calibration_ppi),
            ("reference_distance", self.reference_distance),
            ("reference_face_width_ratio", self.reference_face_width_ratio),
            ("min_z", self.min_z),
            ("max_z", self.max_z),
            ("camera_near", self.camera_near),
            ("camera_far", self.camera_far),
            ("light_intensity", self.light_intensity),
            ("fog_near", self.fog_near),
            ("fog_far", self.fog_far),
        ];

        for (name, value) in scalars {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(ViewerError::InvalidSettings(format!(
                    "{name} must be a finite number"
                )));
            }
        }

        if self
            .light_position
            .is_some_and(|p| p.iter().any(|v| !v.is_finite()))
        {
            return Err(ViewerError::InvalidSettings(
                "light_position must be finite".to_string(),
            ));
        }

        Ok(())
    }
}

/// Full-record patch carrying every field of `settings`.
impl From<ViewerSettings> for SettingsPatch {
    fn from(settings: ViewerSettings) -> Self {
        macro_rules! every {
            ($($field:ident),* $(,)?) => {
                SettingsPatch {
                    $($field: Some(settings.$field),)*
                }
            };
        }

        every!(
            sensitivity_x,
            sensitivity_y,
            sensitivity_z,
            offset_x_cm,
            offset_y_cm,
            mirror_horizontal,
            smoothing_factor,
            stabilization,
            physics_mode,
            visual_convergence_mode,
            convergence,
            calibration_ppi,
            reference_distance,
            reference_face_width_ratio,
            min_z,
            max_z,
            camera_near,
            camera_far,
            max_detection_fps,
            input_size,
            show_crosshair,
            light_enabled,
            light_follow_camera,
            light_position,
            light_intensity,
            light_colour,
            fog_near,
            fog_far,
        )
    }
}

/// Published after every accepted settings change.
#[derive(Event, Debug, Clone)]
pub struct SettingsChanged {
    pub changed: Vec<&'static str>,
}

impl SettingsChanged {
    pub fn touches(&self, field: &str) -> bool {
        self.changed.iter().any(|name| *name == field)
    }
}

/// Single entry point for configuration changes. Publishes `SettingsChanged`
/// when at least one field actually changed.
pub fn update_settings(
    settings: &mut ViewerSettings,
    patch: SettingsPatch,
    changes: &mut EventWriter<SettingsChanged>,
) -> Result<Vec<&'static str>> {
    let changed = settings.apply(patch)?;
    if !changed.is_empty() {
        info!("Settings updated: {:?}", changed);
        changes.write(SettingsChanged {
            changed: changed.clone(),
        });
    }
    Ok(changed)
}
