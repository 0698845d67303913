//! Shared tuning constants for the parallax viewer.

pub mod display;
pub mod locomotion;
pub mod render_settings;
pub mod tracking;
