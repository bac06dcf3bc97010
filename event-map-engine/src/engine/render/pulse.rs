use crate::engine::anchors::registry::AnchorRegistry;
use crate::engine::events::model::EventModel;
use crate::engine::render::markers::MarkerBuffer;
use crate::tools::selection::Selection;
use bevy::color::Mix;
use bevy::prelude::*;
use constants::render_settings::*;
use std::f64::consts::TAU;

/// Runtime-tunable pulse parameters shared by every marker.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct PulseSettings {
    pub period_ms: f32,
    pub base_scale: f32,
    pub amplitude: f32,
    pub selection_boost: f32,
}

impl Default for PulseSettings {
    fn default() -> Self {
        Self {
            period_ms: PULSE_PERIOD_MS,
            base_scale: PULSE_BASE_SCALE,
            amplitude: PULSE_AMPLITUDE,
            selection_boost: SELECTION_BOOST,
        }
    }
}

impl PulseSettings {
    /// Shared oscillation in `[0, 1]` for wall-clock `now_ms`.
    pub fn pulse01(&self, now_ms: f64) -> f32 {
        let period = f64::from(self.period_ms.max(1.0));
        let phase = now_ms.rem_euclid(period) * (TAU / period);
        (0.5 + 0.5 * phase.sin()) as f32
    }

    pub fn marker_scale(&self, pulse01: f32, selected: bool) -> f32 {
        let scale = self.base_scale + self.amplitude * pulse01;
        if selected {
            scale * self.selection_boost
        } else {
            scale
        }
    }
}

/// Three-stop severity ramp, linear within each half of `[0, 1]`. Stops are
/// blended in linear light.
pub fn heat_color(severity: f32) -> Srgba {
    let [low, mid, high] = SEVERITY_RAMP.map(|hex| {
        let [r, g, b] = hex_to_rgb(hex);
        Srgba::rgb(r, g, b)
    });
    let s = if severity.is_nan() {
        0.0
    } else {
        severity.clamp(0.0, 1.0)
    };
    if s < 0.5 {
        lerp_rgb(low, mid, s / 0.5)
    } else {
        lerp_rgb(mid, high, (s - 0.5) / 0.5)
    }
}

fn lerp_rgb(a: Srgba, b: Srgba, t: f32) -> Srgba {
    LinearRgba::from(a).mix(&LinearRgba::from(b), t).into()
}

/// Decay anchor heat, then write every marker's pulse transform and heat
/// colour into the instance buffer. Timing is global so all markers move in
/// lockstep and only colour differs between them.
pub fn animate_markers(
    time: Res<Time>,
    pulse: Res<PulseSettings>,
    selection: Res<Selection>,
    registry: Res<AnchorRegistry>,
    mut model: ResMut<EventModel>,
    mut buffer: ResMut<MarkerBuffer>,
) {
    let dt = time.delta_secs().min(MAX_FRAME_DELTA_SECS);
    model.decay_all(dt);

    if registry.is_empty() {
        return;
    }

    let phase = pulse.pulse01(time.elapsed_secs_f64() * 1000.0);
    for anchor in registry.iter() {
        let scale = pulse.marker_scale(phase, selection.is_selected(anchor.index));
        buffer.set_instance_transform(anchor.index, marker_transform(anchor.world_position, scale));
        buffer.set_instance_color(anchor.index, heat_color(model.heat(anchor.index)));
    }
    buffer.mark_dirty();
}

/// Marker placement for an anchor at `world_position`.
pub fn marker_transform(world_position: Vec3, scale: f32) -> Transform {
    Transform::from_translation(world_position + Vec3::Y * MARKER_LIFT)
        .with_scale(Vec3::splat(scale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pulse_spans_unit_range() {
        let pulse = PulseSettings::default();
        assert_relative_eq!(pulse.pulse01(0.0), 0.5, epsilon = 1e-6);
        assert_relative_eq!(pulse.pulse01(300.0), 1.0, epsilon = 1e-6);
        assert_relative_eq!(pulse.pulse01(900.0), 0.0, epsilon = 1e-6);
        // Same phase one period later.
        assert_relative_eq!(pulse.pulse01(1500.0), pulse.pulse01(300.0), epsilon = 1e-6);
    }

    #[test]
    fn pulse_is_bounded_for_any_time() {
        let pulse = PulseSettings {
            period_ms: 733.0,
            ..default()
        };
        for step in 0..2000 {
            let value = pulse.pulse01(step as f64 * 17.3);
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn selected_marker_is_boosted() {
        let pulse = PulseSettings::default();
        assert_relative_eq!(pulse.marker_scale(0.0, false), 0.7);
        assert_relative_eq!(pulse.marker_scale(1.0, false), 1.0);
        assert_relative_eq!(pulse.marker_scale(1.0, true), 1.2);
    }

    #[test]
    fn ramp_hits_its_stops() {
        let low = heat_color(0.0);
        assert_relative_eq!(low.red, 0xf4 as f32 / 255.0, epsilon = 1e-4);
        assert_relative_eq!(low.green, 0xc4 as f32 / 255.0, epsilon = 1e-4);
        let mid = heat_color(0.5);
        assert_relative_eq!(mid.green, 0x8c as f32 / 255.0, epsilon = 1e-4);
        let high = heat_color(1.0);
        assert_relative_eq!(high.green, 0x2d as f32 / 255.0, epsilon = 1e-4);
        // Out of range input is clamped.
        assert_eq!(heat_color(3.0), heat_color(1.0));
        assert_eq!(heat_color(-1.0), heat_color(0.0));
    }

    #[test]
    fn ramp_blends_in_linear_light() {
        let low = LinearRgba::from(Srgba::rgb(0xf4 as f32 / 255.0, 0xc4 as f32 / 255.0, 0x30 as f32 / 255.0));
        let mid = LinearRgba::from(Srgba::rgb(1.0, 0x8c as f32 / 255.0, 0.0));
        let expected = Srgba::from(LinearRgba::rgb(
            (low.red + mid.red) / 2.0,
            (low.green + mid.green) / 2.0,
            (low.blue + mid.blue) / 2.0,
        ));

        let quarter = heat_color(0.25);
        assert_relative_eq!(quarter.green, expected.green, epsilon = 1e-4);
        assert_relative_eq!(quarter.blue, expected.blue, epsilon = 1e-4);
        // Brighter than a gamma-space midpoint.
        let gamma_mid = (0xc4 as f32 + 0x8c as f32) / 2.0 / 255.0;
        assert!(quarter.green > gamma_mid + 0.005);
    }

    #[test]
    fn marker_sits_above_anchor() {
        let transform = marker_transform(Vec3::new(1.0, 2.0, 3.0), 0.9);
        assert_relative_eq!(transform.translation.y, 2.0 + MARKER_LIFT);
        assert_eq!(transform.scale, Vec3::splat(0.9));
    }
}
