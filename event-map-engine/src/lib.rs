//! Live spatial event map.
//!
//! Discovers named anchors in a glTF scene, ingests severity events keyed by
//! anchor name from a WebSocket stream or a simulator, and visualises them as
//! pulsing markers, a decaying floor heatmap and an optional x-ray view.

pub mod engine;
pub mod rpc;
pub mod tools;

pub use engine::core::app_setup::create_app;
