//! Core application setup and state management.
//!
//! Handles application lifecycle, window configuration, state transitions,
//! logging and plugin initialisation for both native and WASM targets.

/// Application setup and plugin configuration for the Bevy engine.
///
/// Creates the main app with loading, ingestion, animation and overlay
/// systems scheduled as one ordered chain per frame.
pub mod app_setup;

/// Application state machine and loading transitions.
pub mod app_state;

/// Error types for recoverable engine failures.
pub mod error;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and vsync settings.
pub mod window_config;
