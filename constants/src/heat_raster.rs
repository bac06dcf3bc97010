/// Heat raster resolution (pixels per side).
pub const HEAT_RASTER_SIZE: usize = 512;

/// World units covered by the heat floor along X and Z.
pub const HEAT_FLOOR_SIZE: f32 = 200.0;

/// Height of the heat floor above the ground plane, avoids z-fighting with the grid.
pub const HEAT_FLOOR_ELEVATION: f32 = 0.01;

/// Floor material opacity while the heatmap is visible.
pub const HEAT_FLOOR_OPACITY: f32 = 0.55;

/// Fraction of every channel removed per decay step.
pub const HEAT_DECAY_ALPHA: f32 = 0.04;

/// Blob radius in pixels at severity zero.
pub const HEAT_BLOB_BASE_RADIUS: f32 = 20.0;

/// Additional blob radius in pixels at severity one.
pub const HEAT_BLOB_SEVERITY_RADIUS: f32 = 40.0;

/// Channel values below one 8-bit step are flushed to zero during decay.
pub const HEAT_ZERO_THRESHOLD: f32 = 1.0 / 255.0;
