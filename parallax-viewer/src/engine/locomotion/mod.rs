//! Keyboard locomotion through the scene.
//!
//! The viewer's eye is pinned to the head-tracked position, so walking and
//! turning are expressed by moving the scene root the opposite way.

/// Avatar pose, per-frame key input and the inverse scene transform.
pub mod avatar;

/// Scene root marker and the systems that drive it.
pub mod scene_root;
