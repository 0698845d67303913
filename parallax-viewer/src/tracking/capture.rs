use bevy::prelude::*;
use serde::Serialize;

use crate::{Result, ViewerError};

/// Lifecycle of the camera stream feeding the detector.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    Requesting { generation: u64 },
    Active { generation: u64, width: u32, height: u32 },
    Failed { reason: String },
}

/// Instruction for whatever owns the physical device (host page or native adapter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CaptureCommand {
    Release { generation: u64 },
    Open { generation: u64, input_size: u32 },
}

/// Scoped camera stream. A new request always releases the previous stream
/// first, and bumps the generation so late detections from it are discarded.
#[derive(Resource, Debug)]
pub struct CaptureSession {
    state: CaptureState,
    generation: u64,
    input_size: u32,
    outbox: Vec<CaptureCommand>,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self {
            state: CaptureState::Idle,
            generation: 0,
            input_size: 0,
            outbox: Vec::new(),
        }
    }
}

impl CaptureSession {
    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    /// Ask for a stream at `input_size`. Any held or pending stream is released.
    pub fn request(&mut self, input_size: u32) -> u64 {
        match self.state {
            CaptureState::Requesting { generation } | CaptureState::Active { generation, .. } => {
                self.outbox.push(CaptureCommand::Release { generation });
            }
            CaptureState::Idle | CaptureState::Failed { .. } => {}
        }

        self.generation += 1;
        self.input_size = input_size;
        self.state = CaptureState::Requesting {
            generation: self.generation,
        };
        self.outbox.push(CaptureCommand::Open {
            generation: self.generation,
            input_size,
        });
        info!(
            "Capture stream requested (generation {}, input size {})",
            self.generation, input_size
        );
        self.generation
    }

    /// Device reported the negotiated resolution. Stale generations are ignored.
    pub fn on_opened(&mut self, generation: u64, width: u32, height: u32) -> Result<()> {
        if generation != self.generation {
            // The superseded stream must not stay open.
            self.outbox.push(CaptureCommand::Release { generation });
            return Err(ViewerError::CaptureUnavailable(format!(
                "stale stream generation {generation}, current is {}",
                self.generation
            )));
        }
        if width == 0 || height == 0 {
            self.state = CaptureState::Failed {
                reason: "capture reported an empty resolution".to_string(),
            };
            return Err(ViewerError::CaptureUnavailable(
                "capture reported an empty resolution".to_string(),
            ));
        }
        self.state = CaptureState::Active {
            generation,
            width,
            height,
        };
        info!("Capture stream active: {}x{}", width, height);
        Ok(())
    }

    /// Device could not be opened. Fatal to tracking only.
    pub fn on_failed(&mut self, generation: u64, error: &ViewerError) {
        if generation != self.generation {
            return;
        }
        error!("Capture failed: {}", error);
        self.state = CaptureState::Failed {
            reason: error.to_string(),
        };
    }

    /// Whether a detection taken from `generation` should be used.
    pub fn accepts(&self, generation: u64) -> bool {
        matches!(self.state, CaptureState::Active { generation: active, .. } if active == generation)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, CaptureState::Failed { .. })
    }

    /// Negotiated frame size once the stream is active.
    pub fn frame_size(&self) -> Option<Vec2> {
        match self.state {
            CaptureState::Active { width, height, .. } => {
                Some(Vec2::new(width as f32, height as f32))
            }
            _ => None,
        }
    }

    pub fn take_commands(&mut self) -> Vec<CaptureCommand> {
        std::mem::take(&mut self.outbox)
    }

    pub fn status_message(&self) -> String {
        match &self.state {
            CaptureState::Idle => "Camera idle".to_string(),
            CaptureState::Requesting { .. } => "Starting camera...".to_string(),
            CaptureState::Active { width, height, .. } => format!("Camera active ({width}x{height})"),
            CaptureState::Failed { reason } => format!("Camera unavailable: {reason}"),
        }
    }
}
