use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::capture::{CaptureCommand, CaptureSession};
use super::detection::{DetectionBox, DetectionFeed, DetectorFrame, FaceDetection};
use crate::engine::settings::ViewerSettings;

const MIN_FACE_SCALE: f32 = 0.2;
const MAX_FACE_SCALE: f32 = 5.0;

/// Native stand-in for a webcam: the cursor is the face centre and the scroll
/// wheel changes the apparent face size (closer or farther).
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct PointerHead {
    pub face_scale: f32,
}

impl Default for PointerHead {
    fn default() -> Self {
        Self { face_scale: 1.0 }
    }
}

impl PointerHead {
    pub fn scroll(&mut self, lines: f32) {
        self.face_scale = (self.face_scale * (1.0 + 0.1 * lines)).clamp(MIN_FACE_SCALE, MAX_FACE_SCALE);
    }

    /// Synthetic detector frame for a cursor in a window of `frame` logical pixels.
    pub fn frame_for_cursor(
        &self,
        cursor: Option<Vec2>,
        frame: Vec2,
        generation: u64,
        settings: &ViewerSettings,
    ) -> DetectorFrame {
        let detection = cursor.map(|cursor| {
            // A selfie camera sees the user mirrored.
            let centre_x = if settings.mirror_horizontal {
                frame.x - cursor.x
            } else {
                cursor.x
            };
            let width = settings.reference_face_width_ratio() * frame.x * self.face_scale;
            FaceDetection {
                bbox: DetectionBox::new(
                    centre_x - width * 0.5,
                    cursor.y - width * 0.5,
                    width,
                    width,
                ),
                confidence: 1.0,
            }
        });

        DetectorFrame {
            detection,
            frame_width: frame.x,
            frame_height: frame.y,
            generation,
        }
    }
}

/// Opens the synthetic stream at the window's size. Stands in for the host
/// page, which owns the real camera on the web.
pub fn open_pointer_capture(
    mut capture: ResMut<CaptureSession>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let commands = capture.take_commands();
    if commands.is_empty() {
        return;
    }
    let Ok(window) = windows.single() else {
        return;
    };
    for command in commands {
        if let CaptureCommand::Open { generation, .. } = command {
            let width = window.width().round() as u32;
            let height = window.height().round() as u32;
            if let Err(error) = capture.on_opened(generation, width, height) {
                warn!("Pointer capture not opened: {}", error);
            }
        }
    }
}

/// Push the cursor-derived face into the detection feed every frame.
pub fn simulate_head_from_pointer(
    mut head: ResMut<PointerHead>,
    mut scroll_events: EventReader<MouseWheel>,
    windows: Query<&Window, With<PrimaryWindow>>,
    capture: Res<CaptureSession>,
    feed: Res<DetectionFeed>,
    settings: Res<ViewerSettings>,
) {
    let mut scroll_accum = 0.0;
    for ev in scroll_events.read() {
        scroll_accum += match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y * 0.05,
        };
    }
    if scroll_accum.abs() > f32::EPSILON {
        head.scroll(scroll_accum);
    }

    let Some(frame) = capture.frame_size() else {
        return;
    };
    let Ok(window) = windows.single() else {
        return;
    };

    // Cursor in window pixels, rescaled if the window changed since capture opened.
    let window_size = window.size();
    let cursor = window
        .cursor_position()
        .filter(|_| window_size.x > 0.0 && window_size.y > 0.0)
        .map(|cursor| cursor / window_size * frame);

    feed.push(head.frame_for_cursor(cursor, frame, capture.generation(), &settings));
}
