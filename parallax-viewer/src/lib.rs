//! Head-tracked parallax viewer.
//!
//! Turns webcam face detections into a stabilised head position and re-projects
//! the Bevy camera through an off-axis frustum every frame, so the screen behaves
//! like a window into the scene. A keyboard-driven avatar walks through the scene
//! by moving the world inversely while the tracked camera stays anchored to the
//! physical display.

pub mod engine;
pub mod error;
pub mod rpc;
pub mod tracking;

pub use error::{Result, ViewerError};
