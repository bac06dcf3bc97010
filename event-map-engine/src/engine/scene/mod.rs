//! Scene overlays drawn over the loaded model.

/// Floor heat raster: accumulation, decay and texture upload.
pub mod heatmap;

/// See-through mode with translucent surfaces and crease-edge wireframes.
pub mod xray;
