use crate::engine::anchors::registry::AnchorRegistry;
use crate::engine::camera::viewport_camera::ViewportCamera;
use crate::engine::render::markers::MarkerSettings;
use crate::engine::render::pulse::PulseSettings;
use crate::engine::systems::view_mode::ViewModes;
use crate::tools::dashboard::Dashboard;
use crate::tools::selection::{Selection, SelectionChanged, focus_anchor};
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
}

/// JSON-RPC 2.0 error object.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Resource managing bidirectional RPC communication with the host page.
/// Handles both request-response patterns and notification broadcasting.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send notification to the host page without expecting a response.
    pub fn send_notification(&mut self, method: &str, params: serde_json::Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    /// Queue response for transmission to the host page.
    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }
}

/// Plugin establishing WebRPC communication layer for iframe-based deployment.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .add_event::<IncomingRpcMessage>()
            .add_systems(
                Update,
                (
                    process_incoming_messages,
                    handle_rpc_messages,
                    send_outgoing_messages,
                )
                    .chain(),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::Arc;
    use std::sync::Mutex;

    // Thread-safe message queue for cross-thread communication.
    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        // Filter messages to ensure they contain string data.
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();

            // Attempt JSON parsing to validate RPC format before queuing.
            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    if let Some(window) = window() {
        if let Err(e) =
            window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
        {
            error!("Failed to register message listener: {:?}", e);
        }
    }

    // Prevent closure from being dropped by transferring ownership to JS.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

/// Resource wrapping thread-safe message queue for WASM event handling.
#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

/// Event representing incoming RPC message from the host page.
#[derive(Event)]
struct IncomingRpcMessage {
    content: String,
}

fn process_incoming_messages(
    message_queue: Option<Res<MessageQueue>>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let Some(queue_res) = message_queue else {
        return;
    };

    let messages = if let Ok(mut queue) = queue_res.0.lock() {
        std::mem::take(&mut *queue)
    } else {
        Vec::new()
    };

    for message_str in messages {
        message_events.write(IncomingRpcMessage {
            content: message_str,
        });
    }
}

/// Engine state reachable from RPC methods.
#[derive(SystemParam)]
pub struct RpcTargets<'w> {
    selection: ResMut<'w, Selection>,
    selection_events: EventWriter<'w, SelectionChanged>,
    view_modes: ResMut<'w, ViewModes>,
    pulse: ResMut<'w, PulseSettings>,
    marker_settings: ResMut<'w, MarkerSettings>,
    viewport: ResMut<'w, ViewportCamera>,
    registry: Res<'w, AnchorRegistry>,
    dashboard: Res<'w, Dashboard>,
    diagnostics: Res<'w, DiagnosticsStore>,
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut targets: RpcTargets,
) {
    for event in events.read() {
        debug!("Received RPC: {}", event.content);

        let value = match serde_json::from_str::<Value>(&event.content) {
            Ok(value) => value,
            Err(parse_error) => {
                warn!("Discarding unparsable RPC message: {}", parse_error);
                continue;
            }
        };
        let id = value.get("id").cloned();
        match serde_json::from_value::<RpcRequest>(value) {
            Ok(request) => {
                if let Some(response) = handle_rpc_request(&request, &mut targets) {
                    rpc_interface.queue_response(response);
                }
            }
            Err(err) => {
                if let Some(id) = id {
                    rpc_interface.queue_response(create_error_response(
                        id,
                        -32600,
                        "Invalid request",
                        Some(json!({ "reason": err.to_string() })),
                    ));
                }
            }
        }
    }
}

/// Handle individual RPC request and generate response based on method.
fn handle_rpc_request(request: &RpcRequest, targets: &mut RpcTargets) -> Option<RpcResponse> {
    // Only generate responses for requests with IDs (notifications have no ID).
    let id = request.id.clone()?;

    let result = match request.method.as_str() {
        "select_anchor" => handle_select_anchor(
            &request.params,
            &targets.registry,
            &mut targets.selection,
            &mut targets.viewport,
        )
        .map(|(value, changed)| {
            if let Some(selected) = changed {
                targets.selection_events.write(SelectionChanged { selected });
            }
            value
        }),
        "clear_selection" => {
            if targets.selection.deselect() {
                targets
                    .selection_events
                    .write(SelectionChanged { selected: None });
            }
            Ok(json!({ "success": true }))
        }
        "set_view_mode" => handle_set_view_mode(&request.params, &mut targets.view_modes),
        "set_pulse" => handle_set_pulse(&request.params, &mut targets.pulse),
        "set_marker_opacity" => {
            handle_set_marker_opacity(&request.params, &mut targets.marker_settings)
        }
        "get_anchors" => Ok(anchors_json(&targets.registry)),
        "get_selected" => handle_get_selected(&targets.dashboard),
        "get_fps" => handle_get_fps(&targets.diagnostics),
        _ => {
            warn!("Unknown RPC method: {}", request.method);
            return Some(create_error_response(
                id,
                -32601,
                "Method not found",
                Some(json!({"method": request.method})),
            ));
        }
    };

    match result {
        Ok(result_value) => Some(RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result_value),
            error: None,
            id: Some(id),
        }),
        Err(error) => Some(RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id: Some(id),
        }),
    }
}

/// Select an anchor by name, optionally framing it. Returns the response and
/// the new selection when it changed.
fn handle_select_anchor(
    params: &Value,
    registry: &AnchorRegistry,
    selection: &mut Selection,
    viewport: &mut ViewportCamera,
) -> Result<(Value, Option<Option<usize>>), RpcError> {
    #[derive(Deserialize)]
    struct SelectParams {
        id: String,
        #[serde(default)]
        frame: bool,
    }

    let parsed = serde_json::from_value::<SelectParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'id' parameter"))?;
    let index = registry
        .lookup(&parsed.id)
        .ok_or_else(|| RpcError::invalid_params(&format!("Unknown anchor: {}", parsed.id)))?;

    let changed = if parsed.frame {
        focus_anchor(index, registry, selection, viewport).map(|event| event.selected)
    } else {
        selection.select(index).then_some(Some(index))
    };
    info!("Anchor selected via RPC: {}", parsed.id);

    Ok((json!({ "success": true, "index": index, "id": parsed.id }), changed))
}

fn handle_set_view_mode(params: &Value, view_modes: &mut ViewModes) -> Result<Value, RpcError> {
    #[derive(Deserialize)]
    struct ViewModeParams {
        xray: Option<bool>,
        heatmap: Option<bool>,
    }

    let parsed = serde_json::from_value::<ViewModeParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected boolean 'xray' and/or 'heatmap'"))?;
    if let Some(xray) = parsed.xray {
        view_modes.xray = xray;
    }
    if let Some(heatmap) = parsed.heatmap {
        view_modes.heatmap = heatmap;
    }

    Ok(json!({ "xray": view_modes.xray, "heatmap": view_modes.heatmap }))
}

fn handle_set_pulse(params: &Value, pulse: &mut PulseSettings) -> Result<Value, RpcError> {
    #[derive(Deserialize)]
    struct PulseParams {
        period_ms: Option<f32>,
        base_scale: Option<f32>,
        amplitude: Option<f32>,
    }

    let parsed = serde_json::from_value::<PulseParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected numeric pulse parameters"))?;

    // Validate everything before applying anything
    if parsed.period_ms.is_some_and(|p| !p.is_finite() || p <= 0.0) {
        return Err(RpcError::invalid_params("'period_ms' must be positive"));
    }
    let non_negative = |v: Option<f32>| v.is_none_or(|v| v.is_finite() && v >= 0.0);
    if !non_negative(parsed.base_scale) || !non_negative(parsed.amplitude) {
        return Err(RpcError::invalid_params(
            "'base_scale' and 'amplitude' must be non-negative",
        ));
    }

    if let Some(period_ms) = parsed.period_ms {
        pulse.period_ms = period_ms;
    }
    if let Some(base_scale) = parsed.base_scale {
        pulse.base_scale = base_scale;
    }
    if let Some(amplitude) = parsed.amplitude {
        pulse.amplitude = amplitude;
    }

    Ok(json!({
        "period_ms": pulse.period_ms,
        "base_scale": pulse.base_scale,
        "amplitude": pulse.amplitude,
    }))
}

fn handle_set_marker_opacity(
    params: &Value,
    marker_settings: &mut MarkerSettings,
) -> Result<Value, RpcError> {
    #[derive(Deserialize)]
    struct OpacityParams {
        opacity: f32,
    }

    let parsed = serde_json::from_value::<OpacityParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'opacity' parameter"))?;
    if !parsed.opacity.is_finite() {
        return Err(RpcError::invalid_params("'opacity' must be a number"));
    }
    marker_settings.opacity = parsed.opacity.clamp(0.0, 1.0);

    Ok(json!({ "opacity": marker_settings.opacity }))
}

fn anchors_json(registry: &AnchorRegistry) -> Value {
    Value::Array(
        registry
            .iter()
            .map(|anchor| {
                json!({
                    "index": anchor.index,
                    "id": anchor.name,
                    "position": anchor.world_position.to_array(),
                })
            })
            .collect(),
    )
}

fn handle_get_selected(dashboard: &Dashboard) -> Result<Value, RpcError> {
    let selected = dashboard
        .snapshot
        .as_ref()
        .and_then(|snapshot| snapshot.selected.as_ref());
    serde_json::to_value(selected).map_err(|e| RpcError::internal_error(&e.to_string()))
}

/// Handle FPS retrieval with diagnostic system integration.
fn handle_get_fps(diagnostics: &DiagnosticsStore) -> Result<Value, RpcError> {
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps_diagnostic| fps_diagnostic.smoothed())
        .unwrap_or(0.0) as f32;

    Ok(json!({
        "fps": fps
    }))
}

/// Create standardized error response with optional data payload.
fn create_error_response(
    id: serde_json::Value,
    code: i32,
    message: &str,
    data: Option<serde_json::Value>,
) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0".to_string(),
        result: None,
        error: Some(RpcError {
            code,
            message: message.to_string(),
            data,
        }),
        id: Some(id),
    }
}

/// Send queued notifications and responses to the host page.
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    // Send notifications first.
    for notification in rpc_interface.outgoing_notifications.drain(..) {
        send_message_to_parent(&notification);
    }

    // Send responses second to maintain order.
    for response in rpc_interface.outgoing_responses.drain(..) {
        send_message_to_parent(&response);
    }
}

/// Send serialized message to the parent window.
fn send_message_to_parent<T: Serialize>(message: &T) {
    #[cfg(target_arch = "wasm32")]
    {
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Some(window) = window() {
                    if let Some(parent) = window.parent().ok().flatten() {
                        if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                            error!("Failed to send message to parent: {:?}", e);
                        }
                    } else {
                        warn!("No parent window available for message transmission");
                    }
                } else {
                    error!("Window object not available");
                }
            }
            Err(e) => {
                error!("Failed to serialize message: {}", e);
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        // No-op for non-WASM targets.
        let _ = message;
    }
}

/// Standard RPC error codes and constructors.
impl RpcError {
    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }

    pub fn internal_error(message: &str) -> Self {
        Self {
            code: -32603,
            message: message.to_string(),
            data: None,
        }
    }
}
