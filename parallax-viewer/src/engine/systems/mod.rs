//! Runtime diagnostics, host notifications and keyboard shortcuts.

/// FPS tracking and notification systems for performance monitoring.
///
/// Sends frame rate updates to the host via RPC and updates the native overlay.
pub mod fps_tracking;

/// Head position readout overlay and throttled `head_update` notifications.
pub mod head_readout;

/// Native keyboard shortcuts for projection modes, crosshair and convergence.
pub mod mode_shortcuts;
