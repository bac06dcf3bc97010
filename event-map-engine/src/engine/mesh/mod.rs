//! Mesh readback and derived geometry.

/// Crease-edge extraction and line-list mesh construction for wireframes.
pub mod edges;

/// Triangle-list readback used by picking and edge extraction.
pub mod triangles;
