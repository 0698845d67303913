//! Per-frame orchestration of the head-tracked viewer.
//!
//! Orders capture, detection, estimation, locomotion, projection and the
//! secondary view-dependent updates into chained system sets.

/// System sets and the plugin that wires the viewer pipeline together.
pub mod orchestrator;
