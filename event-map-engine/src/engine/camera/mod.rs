//! Viewport camera for scene navigation.
//!
//! Orbit, dolly and pan controls around a focus point, with framing of the
//! loaded model and of individual anchors.

/// Viewport camera resource, controller and framing shortcuts.
pub mod viewport_camera;
