//! Start-up configuration loading.
//!
//! Reads `viewer_settings.json` through the JSON asset loader before the
//! viewer enters its running state.

/// Settings asset handle, load polling and the transition to `Running`.
pub mod settings_loader;
