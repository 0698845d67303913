//! Demo scene content and view-dependent extras.
//!
//! Everything spatial hangs off the scene root so locomotion can move it as a
//! whole; the light and the reticle read the current eye position.

/// Floor and back-wall grids plus orbiting spheres.
pub mod demo_scene;

/// Flashlight-style point light and distance fog.
pub mod lighting;

/// Crosshair ray cast against the floor and wall proxies.
pub mod reticle;
