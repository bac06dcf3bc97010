//! Per-frame marker animation and the marker instance buffer.

/// Marker instance buffer and its mirroring into overlay-layer entities.
pub mod markers;

/// Globally synchronised pulse, severity colour ramp and marker animation.
pub mod pulse;
