//! JSON-RPC 2.0 communication layer for host page integration.
//!
//! On the web the viewer runs in an iframe. The host page owns the webcam and
//! the face detector, and talks to the viewer over `postMessage`. On native
//! builds the outgoing side is a no-op.
//!
//! ## Message Flow
//!
//! ```text
//! Host (Parent Window)                       Bevy (iframe)
//!        │ <──── capture_request {generation} ───┤
//!        ├─ capture_opened {generation, w, h} ──> │
//!        ├─ detection_result {detection, ...} ──> │ (every detector frame)
//!        │ <─────────── head_update {x, y, z} ───┤ (throttled)
//!        ├─ update_settings {..} (with ID) ─────> │
//!        │ <──────────── Response (with ID) ─────┤
//! ```
//!
//! Detections must echo the `generation` of the stream they were taken from;
//! results from a released stream are discarded.
//!
//! ## Error Handling
//!
//! Standard JSON-RPC 2.0 error codes:
//! - `-32601`: Method not found
//! - `-32602`: Invalid params (malformed or non-finite settings, bad payloads)
//! - `-32603`: Internal error
//!
//! ## Methods
//!
//! ### Configuration
//! - `update_settings`: Merge a partial settings record, returns the changed field names
//! - `get_settings`: Retrieve the active settings record
//!
//! ### Tracking
//! - `get_head_state`: Current smoothed head position (decimetres)
//! - `get_tracking_status`: Capture and face visibility status
//!
//! ### Locomotion
//! - `get_avatar_pose`: Avatar position, yaw and pitch
//! - `reset_avatar`: Zero position and/or rotation (`{"position": bool, "rotation": bool}`)
//!
//! ### Diagnostics
//! - `get_fps`: Retrieve current frame rate
//!
//! ### Host Detector and Camera
//! - `detection_result`: Face box for one frame, tagged with the capture generation
//! - `detection_error`: Detector failure for one frame
//! - `capture_opened`: Stream for a generation is live at the given resolution
//! - `capture_failed`: Stream could not be opened (`permission_denied` flag)
//!
//! ### Outgoing Notifications
//! - `capture_request` / `capture_release`: Open or close the webcam stream
//! - `head_update`: Throttled head position
//! - `tracking_status`: Capture and face visibility changes
//! - `settings_changed`: Changed field names plus the full settings record
//! - `fps_update`: Frame rate every half second

/// JSON-RPC 2.0 bidirectional communication system for host page integration.
///
/// Handles request-response patterns, notifications, and WASM message listeners.
pub mod web_rpc;
