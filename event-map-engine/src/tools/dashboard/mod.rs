//! Operator dashboard: anchor rows, selected-anchor details, connection
//! status and the running event counter.
//!
//! A `DashboardSnapshot` is rebuilt on a fixed cadence and whenever the
//! selection changes. Native builds render it in a text panel; web builds
//! forward it to the host page as a `dashboard_update` notification.

/// Native text panel rendering the latest snapshot.
pub mod panel;

/// Serialisable snapshot built from registry, event model and selection.
pub mod snapshot;

use bevy::prelude::*;
use std::time::Duration;

use crate::engine::anchors::registry::AnchorRegistry;
use crate::engine::camera::viewport_camera::MainCamera;
use crate::engine::events::ingestion::EventIngestion;
use crate::engine::events::model::EventModel;
use crate::rpc::web_rpc::WebRpcInterface;
use crate::tools::selection::{Selection, SelectionChanged};
use snapshot::DashboardSnapshot;

pub const DASHBOARD_REFRESH: Duration = Duration::from_millis(500);

#[derive(Resource)]
pub struct Dashboard {
    pub snapshot: Option<DashboardSnapshot>,
    refresh: Timer,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self {
            snapshot: None,
            refresh: Timer::new(DASHBOARD_REFRESH, TimerMode::Repeating),
        }
    }
}

pub fn refresh_dashboard(
    time: Res<Time>,
    mut dashboard: ResMut<Dashboard>,
    mut selection_events: EventReader<SelectionChanged>,
    registry: Res<AnchorRegistry>,
    model: Res<EventModel>,
    ingestion: Res<EventIngestion>,
    selection: Res<Selection>,
    camera: Query<&GlobalTransform, With<MainCamera>>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    let selection_changed = selection_events.read().last().copied();
    let due = dashboard.refresh.tick(time.delta()).just_finished();
    if !due && selection_changed.is_none() {
        return;
    }

    let camera_position = camera
        .single()
        .map(|xf| xf.translation())
        .unwrap_or(Vec3::ZERO);
    let snapshot = DashboardSnapshot::build(
        &registry,
        &model,
        ingestion.status(),
        selection.selected(),
        camera_position,
        time.elapsed_secs_f64(),
    );

    if let Some(changed) = selection_changed {
        rpc_interface.send_notification(
            "anchor_selected",
            serde_json::json!({
                "index": changed.selected,
                "id": changed.selected.and_then(|i| registry.get(i)).map(|a| a.name.clone()),
                "details": snapshot.selected,
            }),
        );
    }
    if due {
        match serde_json::to_value(&snapshot) {
            Ok(params) => rpc_interface.send_notification("dashboard_update", params),
            Err(err) => error!("Failed to serialise dashboard snapshot: {}", err),
        }
    }
    dashboard.snapshot = Some(snapshot);
}
