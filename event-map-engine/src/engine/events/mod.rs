//! Event state and its producers.
//!
//! Live messages and simulated events share one ingress: both become
//! `InboundEvent`s that are applied to the `EventModel` in a single system.

/// Connection state machine, fallback policy and the ingress systems.
pub mod ingestion;

/// Inbound JSON message parsing and coercion.
pub mod message;

/// Per-anchor decaying heat and bounded history.
pub mod model;

/// Fixed-period random event producer.
pub mod simulator;
