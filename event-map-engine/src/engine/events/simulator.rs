use super::model::EventInput;
use crate::engine::anchors::registry::AnchorRegistry;
use bevy::prelude::*;
use constants::event_types::SIMULATED_EVENT_TYPES;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Map;
use std::time::Duration;

/// Default interval between simulated events.
pub const SIMULATION_PERIOD: Duration = Duration::from_millis(1500);

/// Simulated severities are drawn uniformly from this range.
pub const SIMULATED_SEVERITY_MIN: f32 = 0.3;
pub const SIMULATED_SEVERITY_MAX: f32 = 1.0;

/// Fixed-period producer of random events, used when no live feed is available.
/// Output goes through the same ingress path as transport messages.
pub struct EventSimulator {
    timer: Timer,
    running: bool,
    rng: StdRng,
}

impl Default for EventSimulator {
    fn default() -> Self {
        Self::new(SIMULATION_PERIOD, StdRng::from_entropy())
    }
}

impl EventSimulator {
    pub fn new(period: Duration, rng: StdRng) -> Self {
        Self {
            timer: Timer::new(period, TimerMode::Repeating),
            running: false,
            rng,
        }
    }

    /// Start the simulator. Returns `true` only if this call started it;
    /// it is a no-op when already running or when there are no anchors.
    pub fn start(&mut self, anchor_count: usize) -> bool {
        if self.running || anchor_count == 0 {
            return false;
        }
        self.running = true;
        self.timer.reset();
        true
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance the timer, producing one event per elapsed period.
    pub fn tick(&mut self, delta: Duration, registry: &AnchorRegistry) -> Vec<EventInput> {
        if !self.running || registry.is_empty() {
            return Vec::new();
        }
        self.timer.tick(delta);
        (0..self.timer.times_finished_this_tick())
            .filter_map(|_| self.next_event(registry))
            .collect()
    }

    fn next_event(&mut self, registry: &AnchorRegistry) -> Option<EventInput> {
        let index = self.rng.gen_range(0..registry.len());
        let anchor = registry.get(index)?;
        let severity = self
            .rng
            .gen_range(SIMULATED_SEVERITY_MIN..=SIMULATED_SEVERITY_MAX);
        let event_type = SIMULATED_EVENT_TYPES[self.rng.gen_range(0..SIMULATED_EVENT_TYPES.len())];

        Some(EventInput {
            anchor_id: anchor.name.clone(),
            severity,
            event_type: event_type.to_string(),
            payload: Map::new(),
            source_ts: None,
        })
    }
}
