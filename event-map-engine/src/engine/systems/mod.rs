//! Runtime systems for view control and diagnostics.

/// Frame rate display and `fps_update` notifications.
pub mod fps_tracking;

/// Heatmap and x-ray view mode state with keyboard toggles.
pub mod view_mode;
