//! Error types for the parallax viewer.

use thiserror::Error;

/// Main error type for the viewer
#[derive(Error, Debug)]
pub enum ViewerError {
    /// Camera could not be opened or stopped delivering frames
    #[error("Capture device unavailable: {0}")]
    CaptureUnavailable(String),

    /// User or browser refused camera access
    #[error("Capture permission denied")]
    PermissionDenied,

    /// Face detector raised an error for a frame
    #[error("Detector error: {0}")]
    Detector(String),

    /// A settings update carried an unusable value
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Numeric input rejected at a component boundary
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON (de)serialisation failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results with the viewer error type
pub type Result<T> = std::result::Result<T, ViewerError>;
