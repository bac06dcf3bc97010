//! JSON-RPC 2.0 communication layer for host page integration.
//!
//! Implements bidirectional messaging between the Bevy engine and a host page via
//! iframe postMessage, supporting both request-response and notification patterns.
//!
//! ## Architecture
//!
//! The RPC system uses standard JSON-RPC 2.0 protocol with:
//! - **Requests**: Expect responses with matching IDs
//! - **Notifications**: One-way messages without responses
//! - **Responses**: Reply to requests with results or errors
//!
//! ## Message Flow
//!
//! ```text
//! Host (Parent Window)   <──postMessage──>  Bevy (iframe)
//!        │                                        │
//!        ├─ Request (with ID) ──────────────────> │
//!        │                                        ├─ Process request
//!        │ <───────────────── Response (with ID) ─┤
//!        │                                        │
//!        │ <────────── Notification (no ID) ─────┤
//! ```
//!
//! ## Dispatch
//!
//! `handle_rpc_request()` matches on the method name and delegates to a
//! `handle_*` function taking the parsed params and only the resources it
//! touches. Handlers validate every parameter before mutating anything and
//! return `RpcError::invalid_params` on bad input. Systems push one-way
//! updates with `WebRpcInterface::send_notification()`.
//!
//! ## Error Handling
//!
//! Standard JSON-RPC 2.0 error codes:
//! - `-32600`: Invalid request
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//!
//! ## Existing Methods
//!
//! ### Selection
//! - `select_anchor`: Select an anchor by `id`, optionally `frame` it
//! - `clear_selection`: Clear the current selection
//! - `get_selected`: Details of the selected anchor, or `null`
//!
//! ### View Control
//! - `set_view_mode`: Toggle `xray` and/or `heatmap`
//! - `set_pulse`: Adjust `period_ms`, `base_scale` and `amplitude`
//! - `set_marker_opacity`: Marker `opacity` in `[0, 1]`
//!
//! ### Scene
//! - `get_anchors`: Every anchor with index, id and position
//!
//! ### Diagnostics
//! - `get_fps`: Retrieve current frame rate
//!
//! ## Notifications
//!
//! - `dashboard_update`: Full dashboard snapshot every 0.5 s
//! - `anchor_selected`: Selection changes from any source
//! - `fps_update`: Smoothed frame rate every 0.5 s

/// JSON-RPC 2.0 bidirectional communication system for host page integration.
///
/// Handles request-response patterns, notifications, and WASM message listeners.
pub mod web_rpc;
