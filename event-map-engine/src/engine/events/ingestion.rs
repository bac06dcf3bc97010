use super::message::parse_event_message;
use super::model::{EventInput, EventModel};
use super::simulator::EventSimulator;
use crate::engine::anchors::AnchorsRegistered;
use crate::engine::anchors::registry::AnchorRegistry;
use crate::engine::assets::startup_config::StartupConfig;
use crate::engine::scene::heatmap::HeatRaster;
use crate::engine::systems::view_mode::ViewModes;
use crate::engine::transport::{self, TransportQueue, TransportSignal};
use bevy::prelude::*;
use serde::Serialize;

/// Connection state shown to the operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Idle,
    Disabled,
    Connecting,
    Connected,
    Closed,
    Error,
    Failed,
    Simulating,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Disabled => "disabled",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closed => "closed",
            Self::Error => "error",
            Self::Failed => "failed",
            Self::Simulating => "simulating",
        }
    }
}

/// An event ready to be applied to the model, from either producer.
#[derive(Event, Debug, Clone)]
pub struct InboundEvent(pub EventInput);

/// Connection state machine and fallback policy.
///
/// Transport failures of any kind move to their terminal status and, when
/// simulation is allowed, hand over to the simulator. The endpoint is never
/// retried. Once simulating, later transport signals leave the status alone.
#[derive(Resource, Default)]
pub struct EventIngestion {
    status: ConnectionStatus,
    simulate_fallback: bool,
    simulator: EventSimulator,
    dropped_messages: u64,
}

impl EventIngestion {
    pub fn new(simulate_fallback: bool, simulator: EventSimulator) -> Self {
        Self {
            simulate_fallback,
            simulator,
            ..default()
        }
    }

    /// Begin ingestion. Returns `true` when the caller should open a transport
    /// connection to `endpoint`.
    pub fn start(&mut self, endpoint: Option<&str>, anchor_count: usize) -> bool {
        match endpoint.map(str::trim).filter(|url| !url.is_empty()) {
            Some(url) => {
                info!("Connecting to event stream at {}", url);
                self.status = ConnectionStatus::Connecting;
                true
            }
            None => {
                info!("No event stream configured");
                self.status = ConnectionStatus::Disabled;
                self.fall_back(anchor_count);
                false
            }
        }
    }

    /// Apply a transport signal. Returns the message text for `Message` signals.
    pub fn on_signal(&mut self, signal: TransportSignal, anchor_count: usize) -> Option<String> {
        let next = match signal {
            TransportSignal::Message(text) => return Some(text),
            TransportSignal::Opened => ConnectionStatus::Connected,
            TransportSignal::Closed => ConnectionStatus::Closed,
            TransportSignal::Errored(reason) => {
                warn!("Event stream error: {}", reason);
                ConnectionStatus::Error
            }
            TransportSignal::ConnectFailed(reason) => {
                error!("Event stream connection failed: {}", reason);
                ConnectionStatus::Failed
            }
        };

        if self.status != ConnectionStatus::Simulating {
            self.status = next;
        }
        if matches!(
            next,
            ConnectionStatus::Closed | ConnectionStatus::Error | ConnectionStatus::Failed
        ) {
            self.fall_back(anchor_count);
        }
        None
    }

    fn fall_back(&mut self, anchor_count: usize) {
        if !self.simulate_fallback {
            return;
        }
        if self.simulator.start(anchor_count) {
            info!("Simulating events across {} anchors", anchor_count);
            self.status = ConnectionStatus::Simulating;
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn is_simulating(&self) -> bool {
        self.simulator.is_running()
    }

    pub fn dropped_messages(&self) -> u64 {
        self.dropped_messages
    }

    fn record_dropped(&mut self) {
        self.dropped_messages += 1;
    }
}

/// Once anchors are known, open the configured stream or fall back.
pub fn start_event_ingestion(
    mut commands: Commands,
    mut registered: EventReader<AnchorsRegistered>,
    config: Option<Res<StartupConfig>>,
    mut ingestion: ResMut<EventIngestion>,
) {
    let Some(config) = config else {
        return;
    };
    let Some(AnchorsRegistered { count }) = registered.read().last().copied() else {
        return;
    };

    ingestion.simulate_fallback = config.simulate_if_no_ws;
    let Some(url) = config.endpoint() else {
        ingestion.start(None, count);
        return;
    };
    if !ingestion.start(Some(url), count) {
        return;
    }

    let queue = TransportQueue::default();
    if let Err(err) = transport::connect(url, queue.clone()) {
        ingestion.on_signal(TransportSignal::ConnectFailed(err.to_string()), count);
    }
    commands.insert_resource(queue);
}

/// Drain transport signals queued since the last frame.
pub fn drain_transport_signals(
    queue: Option<Res<TransportQueue>>,
    registry: Res<AnchorRegistry>,
    mut ingestion: ResMut<EventIngestion>,
    mut inbound: EventWriter<InboundEvent>,
) {
    let Some(queue) = queue else {
        return;
    };

    for signal in queue.drain() {
        let Some(text) = ingestion.on_signal(signal, registry.len()) else {
            continue;
        };
        match parse_event_message(&text) {
            Ok(event) => {
                inbound.write(InboundEvent(event));
            }
            Err(err) => {
                debug!("Dropping inbound message: {}", err);
                ingestion.record_dropped();
            }
        }
    }
}

/// Advance the simulator and emit whatever it produced this frame.
pub fn tick_simulator(
    time: Res<Time>,
    registry: Res<AnchorRegistry>,
    mut ingestion: ResMut<EventIngestion>,
    mut inbound: EventWriter<InboundEvent>,
) {
    for event in ingestion.simulator.tick(time.delta(), &registry) {
        inbound.write(InboundEvent(event));
    }
}

/// Single ingress for live and simulated events.
/// Unknown anchor ids are an expected condition and are dropped silently.
pub fn apply_inbound_events(
    time: Res<Time>,
    registry: Res<AnchorRegistry>,
    view_modes: Res<ViewModes>,
    mut inbound: EventReader<InboundEvent>,
    mut model: ResMut<EventModel>,
    mut raster: ResMut<HeatRaster>,
) {
    let now = time.elapsed_secs_f64();
    for InboundEvent(event) in inbound.read() {
        let Some(index) = registry.lookup(&event.anchor_id) else {
            continue;
        };
        let applied = model.apply_event(
            index,
            event.severity,
            &event.event_type,
            event.payload.clone(),
            event.source_ts,
            now,
        );
        if applied && view_modes.heatmap {
            if let Some(anchor) = registry.get(index) {
                raster.stamp(anchor.world_position.x, anchor.world_position.z, event.severity);
            }
        }
    }
}
