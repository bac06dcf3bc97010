/// Display metadata for an event category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventTypeInfo {
    pub id: &'static str,
    pub label: &'static str,
    /// Hue in degrees, used for history bars.
    pub hue: f32,
}

/// Hue used for categories missing from `EVENT_TYPE_MAP`.
pub const UNKNOWN_EVENT_HUE: f32 = 210.0;

/// Type tag assigned to messages that do not carry one.
pub const DEFAULT_EVENT_TYPE: &str = "unknown";

pub const EVENT_TYPE_MAP: &[EventTypeInfo] = &[
    EventTypeInfo {
        id: "zone_intrusion",
        label: "Zone Intrusion",
        hue: 10.0,
    },
    EventTypeInfo {
        id: "line_crossing",
        label: "Line Crossing",
        hue: 20.0,
    },
    EventTypeInfo {
        id: "loitering",
        label: "Loitering",
        hue: 35.0,
    },
    EventTypeInfo {
        id: "object_left",
        label: "Object Left",
        hue: 290.0,
    },
    EventTypeInfo {
        id: "object_removed",
        label: "Object Removed",
        hue: 280.0,
    },
    EventTypeInfo {
        id: "ppe_missing_hardhat",
        label: "No Hard Hat",
        hue: 0.0,
    },
    EventTypeInfo {
        id: "ppe_missing_hivis",
        label: "No Hi-Vis",
        hue: 330.0,
    },
    EventTypeInfo {
        id: "ppe_missing_glasses",
        label: "No Safety Glasses",
        hue: 300.0,
    },
    EventTypeInfo {
        id: "smoke",
        label: "Smoke",
        hue: 0.0,
    },
    EventTypeInfo {
        id: "fire",
        label: "Fire",
        hue: 0.0,
    },
    EventTypeInfo {
        id: "vehicle_speeding",
        label: "Speeding",
        hue: 15.0,
    },
    EventTypeInfo {
        id: "wrong_way_vehicle",
        label: "Wrong Way",
        hue: 25.0,
    },
    EventTypeInfo {
        id: "crowding",
        label: "Crowding",
        hue: 40.0,
    },
    EventTypeInfo {
        id: "queue_overlimit",
        label: "Queue Overlimit",
        hue: 45.0,
    },
    EventTypeInfo {
        id: "worker_down",
        label: "Worker Down",
        hue: 0.0,
    },
];

/// Categories the simulator draws from.
pub const SIMULATED_EVENT_TYPES: &[&str] = &[
    "zone_intrusion",
    "line_crossing",
    "loitering",
    "ppe_missing_hardhat",
    "ppe_missing_hivis",
    "ppe_missing_glasses",
    "smoke",
    "fire",
    "vehicle_speeding",
    "wrong_way_vehicle",
    "crowding",
    "queue_overlimit",
    "worker_down",
];

/// Look up the display label and hue for a category tag.
/// Unknown tags keep their raw text as the label; empty tags show a dash.
pub fn event_type_meta(type_tag: &str) -> (String, f32) {
    match EVENT_TYPE_MAP.iter().find(|info| info.id == type_tag) {
        Some(info) => (info.label.to_string(), info.hue),
        None if type_tag.is_empty() => ("—".to_string(), UNKNOWN_EVENT_HUE),
        None => (type_tag.to_string(), UNKNOWN_EVENT_HUE),
    }
}
