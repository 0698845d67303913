use bevy::prelude::*;
use serde::Serialize;

use constants::locomotion::{MOVE_SPEED, PITCH_LIMIT, TURN_SPEED};

/// Virtual viewer position and orientation inside the scene.
///
/// The camera itself never leaves the head-tracked eye position; the avatar is
/// applied as an inverse transform on the scene root instead.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AvatarPose {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl AvatarPose {
    /// Horizontal heading from yaw only.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    pub fn right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Integrate one frame of input.
    pub fn step(&mut self, input: &LocomotionInput, steps: &LocomotionSteps, dt: f32) {
        let distance = steps.move_speed * dt;
        let forward = self.forward();
        let right = self.right();

        self.position += forward * input.forward * distance;
        self.position += right * input.strafe * distance;
        self.position += Vec3::Y * input.lift * distance;

        let turn = steps.turn_speed * dt;
        self.yaw += input.yaw * turn;
        self.pitch = (self.pitch + input.pitch * turn).clamp(-PITCH_LIMIT, PITCH_LIMIT);

        // Resets win over motion accumulated this frame.
        if input.reset_position {
            self.reset_position();
        }
        if input.reset_rotation {
            self.reset_rotation();
        }
    }

    pub fn reset_position(&mut self) {
        self.position = Vec3::ZERO;
    }

    pub fn reset_rotation(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
    }

    /// Scene-root transform moving the world instead of the camera:
    /// `w -> pivot + R⁻¹((w - position) - pivot)`.
    pub fn scene_root_transform(&self, pivot: Vec3) -> Transform {
        let inverse = self.rotation().inverse();
        Transform {
            translation: pivot - inverse * (pivot + self.position),
            rotation: inverse,
            scale: Vec3::ONE,
        }
    }
}

/// Per-second step sizes.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct LocomotionSteps {
    pub move_speed: f32,
    pub turn_speed: f32,
}

impl Default for LocomotionSteps {
    fn default() -> Self {
        Self {
            move_speed: MOVE_SPEED,
            turn_speed: TURN_SPEED,
        }
    }
}

/// Held-key axes for one frame. Each axis is the sum of its two opposing keys.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocomotionInput {
    pub forward: f32,
    pub strafe: f32,
    pub lift: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub reset_position: bool,
    pub reset_rotation: bool,
}

impl LocomotionInput {
    pub fn from_keyboard(keyboard: &ButtonInput<KeyCode>) -> Self {
        let axis = |positive: KeyCode, negative: KeyCode| {
            let mut value = 0.0;
            if keyboard.pressed(positive) {
                value += 1.0;
            }
            if keyboard.pressed(negative) {
                value -= 1.0;
            }
            value
        };
        let home = keyboard.pressed(KeyCode::Home);

        Self {
            forward: axis(KeyCode::KeyW, KeyCode::KeyS),
            strafe: axis(KeyCode::KeyD, KeyCode::KeyA),
            lift: axis(KeyCode::KeyE, KeyCode::KeyQ),
            yaw: axis(KeyCode::ArrowLeft, KeyCode::ArrowRight),
            pitch: axis(KeyCode::ArrowUp, KeyCode::ArrowDown),
            reset_position: home || keyboard.pressed(KeyCode::KeyR),
            reset_rotation: home || keyboard.pressed(KeyCode::KeyT),
        }
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

/// Reset request from outside the keyboard (host page).
#[derive(Event, Debug, Clone, Copy)]
pub struct AvatarResetRequest {
    pub position: bool,
    pub rotation: bool,
}
