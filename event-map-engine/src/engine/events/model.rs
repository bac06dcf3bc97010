use bevy::prelude::*;
use constants::render_settings::HEAT_DECAY_RATE;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::VecDeque;

/// Maximum events retained per anchor.
pub const HISTORY_CAPACITY: usize = 20;

/// Weight of the previous heat when a new event arrives.
const HEAT_RETAIN: f32 = 0.9;

/// Weight of the incoming severity.
const HEAT_GAIN: f32 = 0.8;

/// One received event. Never mutated after it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    /// Engine clock seconds at arrival.
    pub timestamp: f64,
    pub severity: f32,
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: Map<String, Value>,
    /// Sender supplied `ts`, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ts: Option<f64>,
}

/// Decaying state for a single anchor, addressed by registry index.
#[derive(Debug, Clone, Default)]
pub struct AnchorState {
    pub heat: f32,
    pub last_event_timestamp: Option<f64>,
    pub last_severity: Option<f32>,
    pub last_type: Option<String>,
    history: VecDeque<EventRecord>,
}

impl AnchorState {
    /// History oldest first.
    pub fn history(&self) -> impl DoubleEndedIterator<Item = &EventRecord> + ExactSizeIterator {
        self.history.iter()
    }

    fn push_record(&mut self, record: EventRecord) {
        while self.history.len() >= HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }
}

/// An event about to be applied, already resolved to an anchor name.
#[derive(Debug, Clone, PartialEq)]
pub struct EventInput {
    pub anchor_id: String,
    pub severity: f32,
    pub event_type: String,
    pub payload: Map<String, Value>,
    pub source_ts: Option<f64>,
}

/// Per-anchor event state in a dense array parallel to the anchor registry.
#[derive(Resource, Debug, Clone)]
pub struct EventModel {
    states: Vec<AnchorState>,
    decay_rate: f32,
    event_count: u64,
}

impl Default for EventModel {
    fn default() -> Self {
        Self::with_anchor_count(0)
    }
}

impl EventModel {
    pub fn with_anchor_count(count: usize) -> Self {
        Self {
            states: vec![AnchorState::default(); count],
            decay_rate: HEAT_DECAY_RATE,
            event_count: 0,
        }
    }

    pub fn with_decay_rate(mut self, rate: f32) -> Self {
        self.decay_rate = rate.max(0.0);
        self
    }

    /// Apply an event to the anchor at `index`. Returns `false` and changes
    /// nothing when the index is out of range.
    pub fn apply_event(
        &mut self,
        index: usize,
        severity: f32,
        event_type: &str,
        payload: Map<String, Value>,
        source_ts: Option<f64>,
        now: f64,
    ) -> bool {
        let Some(state) = self.states.get_mut(index) else {
            return false;
        };

        let severity = clamp_unit(severity);
        state.heat = clamp_unit(state.heat * HEAT_RETAIN + severity * HEAT_GAIN);
        state.last_event_timestamp = Some(now);
        state.last_severity = Some(severity);
        state.last_type = Some(event_type.to_string());
        state.push_record(EventRecord {
            timestamp: now,
            severity,
            event_type: event_type.to_string(),
            payload,
            source_ts,
        });

        self.event_count += 1;
        true
    }

    /// Linear heat decay for one anchor over `dt` seconds.
    pub fn decay(&mut self, index: usize, dt: f32) {
        let rate = self.decay_rate;
        if let Some(state) = self.states.get_mut(index) {
            state.heat = clamp_unit(state.heat - dt.max(0.0) * rate);
        }
    }

    pub fn decay_all(&mut self, dt: f32) {
        for index in 0..self.states.len() {
            self.decay(index, dt);
        }
    }

    pub fn state(&self, index: usize) -> Option<&AnchorState> {
        self.states.get(index)
    }

    pub fn heat(&self, index: usize) -> f32 {
        self.states.get(index).map_or(0.0, |s| s.heat)
    }

    /// Up to `limit` records, most recent first.
    pub fn recent_history(&self, index: usize, limit: usize) -> Vec<&EventRecord> {
        self.states
            .get(index)
            .map(|state| state.history().rev().take(limit).collect())
            .unwrap_or_default()
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Clamp to `[0, 1]`, mapping NaN to zero.
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
