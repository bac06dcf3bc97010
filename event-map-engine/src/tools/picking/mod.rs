//! Pointer picking against markers and model surfaces.

/// Ray primitives: box, sphere and triangle intersection.
pub mod ray;

/// Marker-first picking with name resolution through surface ancestors.
pub mod picker;

/// Hover tracking and double-click orbit re-targeting.
pub mod targeting;
