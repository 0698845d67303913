use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{Result, ViewerError};

/// Face bounding box in source-frame pixels. Lives for a single detection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DetectionBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn centre(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

fn full_confidence() -> f32 {
    1.0
}

/// Detector output for one face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    #[serde(flatten)]
    pub bbox: DetectionBox,
    #[serde(default = "full_confidence")]
    pub confidence: f32,
}

/// One detector invocation: zero-or-one face plus the frame it was found in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorFrame {
    pub detection: Option<FaceDetection>,
    pub frame_width: f32,
    pub frame_height: f32,
    /// Capture session generation the frame was taken from.
    #[serde(default)]
    pub generation: u64,
}

impl DetectorFrame {
    pub fn frame_size(&self) -> Vec2 {
        Vec2::new(self.frame_width, self.frame_height)
    }

    /// Reported frame size, or the capture stream's size when the detector
    /// left it zero or non-finite.
    pub fn frame_size_or(&self, stream: Option<Vec2>) -> Vec2 {
        let reported = self.frame_size();
        if reported.is_finite() && reported.cmpgt(Vec2::ZERO).all() {
            return reported;
        }
        stream.unwrap_or(reported)
    }

    /// Detection box if the face clears the confidence threshold.
    pub fn confident_box(&self, min_confidence: f32) -> Option<DetectionBox> {
        self.detection
            .filter(|d| d.confidence >= min_confidence)
            .map(|d| d.bbox)
    }
}

/// Adapter around a face detector. `poll` never blocks: `None` means no new
/// result is ready yet and the caller keeps its previous state.
pub trait FaceDetector: Send + Sync {
    fn poll(&mut self) -> Option<Result<DetectorFrame>>;
}

/// Detector currently feeding the detection cycle.
#[derive(Resource)]
pub struct ActiveDetector(pub Box<dyn FaceDetector>);

/// Latest-result slot shared between producers (host page, pointer simulation)
/// and the detection cycle. Older unread results are overwritten.
#[derive(Resource, Clone, Default)]
pub struct DetectionFeed {
    slot: Arc<Mutex<Option<Result<DetectorFrame>>>>,
}

impl DetectionFeed {
    pub fn push(&self, frame: DetectorFrame) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(Ok(frame));
        }
    }

    pub fn push_error(&self, message: impl Into<String>) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(Err(ViewerError::Detector(message.into())));
        }
    }
}

impl FaceDetector for DetectionFeed {
    fn poll(&mut self) -> Option<Result<DetectorFrame>> {
        self.slot.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Replays a fixed sequence of detector results, one per poll.
#[derive(Default)]
pub struct ScriptedDetector {
    script: VecDeque<Result<DetectorFrame>>,
}

impl ScriptedDetector {
    pub fn new(frames: impl IntoIterator<Item = Result<DetectorFrame>>) -> Self {
        Self {
            script: frames.into_iter().collect(),
        }
    }
}

impl FaceDetector for ScriptedDetector {
    fn poll(&mut self) -> Option<Result<DetectorFrame>> {
        self.script.pop_front()
    }
}
