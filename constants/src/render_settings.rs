/// Global pulse period in milliseconds; smaller is faster.
pub const PULSE_PERIOD_MS: f32 = 1200.0;

/// Minimum marker scale during the pulse.
pub const PULSE_BASE_SCALE: f32 = 0.7;

/// Scale added at the pulse peak.
pub const PULSE_AMPLITUDE: f32 = 0.3;

/// Scale multiplier for the selected marker.
pub const SELECTION_BOOST: f32 = 1.2;

/// Marker sphere radius at scale 1.
pub const MARKER_RADIUS: f32 = 2.0;

/// Markers float this far above their anchor.
pub const MARKER_LIFT: f32 = 0.2;

/// Default marker opacity.
pub const MARKER_OPACITY: f32 = 0.75;

/// Upper bound for the marker instance buffer.
pub const MAX_MARKERS: usize = 2048;

/// Per-second linear decay of anchor heat.
pub const HEAT_DECAY_RATE: f32 = 0.75;

/// Largest frame delta fed to decay, keeps a stalled frame from wiping all heat.
pub const MAX_FRAME_DELTA_SECS: f32 = 0.1;

/// Severity ramp stops (low, mid, high) as 0xRRGGBB.
pub const SEVERITY_RAMP: [u32; 3] = [0xf4c430, 0xff8c00, 0xff2d2d];

/// Surface opacity while x-ray mode is on.
pub const XRAY_OPACITY: f32 = 0.15;

/// X-ray edge overlay colour (0xRRGGBB) and opacity.
pub const XRAY_EDGE_COLOR: u32 = 0x000000;
pub const XRAY_EDGE_OPACITY: f32 = 0.35;

/// Faces meeting at more than this angle (degrees) produce an overlay edge.
pub const XRAY_EDGE_THRESHOLD_DEG: f32 = 30.0;

/// Fallback x-ray surface colour for meshes without a recorded material.
pub const XRAY_FALLBACK_COLOR: u32 = 0xaaaaaa;

/// Split a 0xRRGGBB colour into normalised sRGB components.
pub const fn hex_to_rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}
