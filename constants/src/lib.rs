//! Shared tunables for the event map engine.
//!
//! Kept free of engine types so tooling and tests can depend on them without
//! pulling in the renderer.

pub mod coordinate_system;
pub mod event_types;
pub mod heat_raster;
pub mod render_settings;
