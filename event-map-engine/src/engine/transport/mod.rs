//! Event stream transport.
//!
//! Socket callbacks (a reader thread natively, JS callbacks on wasm32) never
//! touch engine state. They push `TransportSignal`s into a shared queue that
//! the frame loop drains before any other engine system runs.

#[cfg(not(target_arch = "wasm32"))]
mod native;
#[cfg(target_arch = "wasm32")]
mod web;

use crate::engine::core::error::EngineError;
use bevy::prelude::*;
use std::sync::{Arc, Mutex};

/// Something that happened on the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportSignal {
    Opened,
    Message(String),
    Closed,
    Errored(String),
    ConnectFailed(String),
}

/// Thread-safe signal queue shared with socket callbacks.
#[derive(Resource, Clone, Default)]
pub struct TransportQueue(Arc<Mutex<Vec<TransportSignal>>>);

impl TransportQueue {
    pub fn push(&self, signal: TransportSignal) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push(signal);
        }
    }

    pub fn drain(&self) -> Vec<TransportSignal> {
        if let Ok(mut queue) = self.0.lock() {
            std::mem::take(&mut *queue)
        } else {
            Vec::new()
        }
    }
}

/// Open a WebSocket to `url`, reporting everything through `queue`.
/// An `Err` means the connection could not even be attempted.
pub fn connect(url: &str, queue: TransportQueue) -> Result<(), EngineError> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        native::connect(url, queue)
    }

    #[cfg(target_arch = "wasm32")]
    {
        web::connect(url, queue)
    }
}
