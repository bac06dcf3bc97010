use bevy::prelude::*;
use constants::event_types::event_type_meta;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::engine::anchors::registry::AnchorRegistry;
use crate::engine::events::ingestion::ConnectionStatus;
use crate::engine::events::model::EventModel;

/// Events listed in the selected anchor's detail view.
pub const DETAIL_HISTORY_LIMIT: usize = 10;

/// "42s" under a minute, "3m 5s" beyond. Negative spans read as zero.
pub fn format_time_ago(seconds: f64) -> String {
    let s = seconds.max(0.0).round() as u64;
    if s < 60 {
        format!("{s}s")
    } else {
        format!("{}m {}s", s / 60, s % 60)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnchorRow {
    pub index: usize,
    pub id: String,
    pub heat: f32,
    pub last_severity: Option<f32>,
    pub last_event_ago: Option<String>,
    pub last_type: Option<String>,
    pub last_type_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub ago: String,
    pub severity: f32,
    #[serde(rename = "type")]
    pub event_type: String,
    pub label: String,
    pub hue: f32,
    pub payload: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedDetails {
    pub index: usize,
    pub id: String,
    pub position: [f32; 3],
    pub distance_to_camera: f32,
    pub history: Vec<HistoryRow>,
}

/// Everything the operator panel shows, as one serialisable value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub status: ConnectionStatus,
    pub event_count: u64,
    pub anchors: Vec<AnchorRow>,
    pub selected: Option<SelectedDetails>,
}

impl DashboardSnapshot {
    pub fn build(
        registry: &AnchorRegistry,
        model: &EventModel,
        status: ConnectionStatus,
        selected: Option<usize>,
        camera_position: Vec3,
        now: f64,
    ) -> Self {
        let anchors = registry
            .iter()
            .map(|anchor| {
                let state = model.state(anchor.index);
                let last_type = state.and_then(|s| s.last_type.clone());
                AnchorRow {
                    index: anchor.index,
                    id: anchor.name.clone(),
                    heat: model.heat(anchor.index),
                    last_severity: state.and_then(|s| s.last_severity),
                    last_event_ago: state
                        .and_then(|s| s.last_event_timestamp)
                        .map(|ts| format_time_ago(now - ts)),
                    last_type_label: last_type.as_deref().map(|t| event_type_meta(t).0),
                    last_type,
                }
            })
            .collect();

        let selected = selected.and_then(|index| {
            let anchor = registry.get(index)?;
            let history = model
                .recent_history(index, DETAIL_HISTORY_LIMIT)
                .into_iter()
                .map(|record| {
                    let (label, hue) = event_type_meta(&record.event_type);
                    HistoryRow {
                        ago: format_time_ago(now - record.timestamp),
                        severity: record.severity,
                        event_type: record.event_type.clone(),
                        label,
                        hue,
                        payload: record.payload.clone(),
                    }
                })
                .collect();
            Some(SelectedDetails {
                index,
                id: anchor.name.clone(),
                position: anchor.world_position.to_array(),
                distance_to_camera: camera_position.distance(anchor.world_position),
                history,
            })
        });

        Self {
            status,
            event_count: model.event_count(),
            anchors,
            selected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fixture() -> (AnchorRegistry, EventModel) {
        let mut registry = AnchorRegistry::default();
        registry.register("CCTV_1", Vec3::new(3.0, 0.0, 4.0));
        registry.register("CCTV_2", Vec3::ZERO);
        let mut model = EventModel::with_anchor_count(2);
        for i in 0..12 {
            model.apply_event(0, 0.5, "fire", Map::new(), None, i as f64);
        }
        (registry, model)
    }

    #[test]
    fn time_ago_formats_minutes() {
        assert_eq!(format_time_ago(0.4), "0s");
        assert_eq!(format_time_ago(59.0), "59s");
        assert_eq!(format_time_ago(185.0), "3m 5s");
        assert_eq!(format_time_ago(-3.0), "0s");
    }

    #[test]
    fn snapshot_lists_every_anchor() {
        let (registry, model) = fixture();
        let snapshot = DashboardSnapshot::build(
            &registry,
            &model,
            ConnectionStatus::Simulating,
            None,
            Vec3::ZERO,
            20.0,
        );
        assert_eq!(snapshot.anchors.len(), 2);
        assert_eq!(snapshot.event_count, 12);
        assert_eq!(snapshot.anchors[0].last_event_ago.as_deref(), Some("9s"));
        assert_eq!(snapshot.anchors[1].last_severity, None);
        assert!(snapshot.selected.is_none());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "simulating");
    }

    #[test]
    fn selected_details_are_most_recent_first_and_bounded() {
        let (registry, model) = fixture();
        let snapshot = DashboardSnapshot::build(
            &registry,
            &model,
            ConnectionStatus::Connected,
            Some(0),
            Vec3::ZERO,
            11.0,
        );
        let details = snapshot.selected.unwrap();
        assert_eq!(details.id, "CCTV_1");
        assert_relative_eq!(details.distance_to_camera, 5.0);
        assert_eq!(details.history.len(), DETAIL_HISTORY_LIMIT);
        assert_eq!(details.history[0].ago, "0s");
        assert_eq!(details.history[9].ago, "9s");
    }
}
