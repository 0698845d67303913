use bevy::diagnostic::DiagnosticsStore;
use bevy::ecs::system::SystemParam;
use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ViewerError;
use crate::engine::locomotion::avatar::{AvatarPose, AvatarResetRequest};
use crate::engine::settings::{SettingsChanged, SettingsPatch, ViewerSettings, update_settings};
use crate::engine::systems::fps_tracking::smoothed_fps;
use crate::tracking::capture::CaptureSession;
use crate::tracking::detection::{DetectionFeed, DetectorFrame};
use crate::tracking::detection_cycle::TrackingStatus;
use crate::tracking::head_pose::HeadPoseEstimator;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

/// JSON-RPC 2.0 request structure. Requests without an `id` are notifications.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
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
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Resource managing bidirectional RPC communication between the host page and Bevy.
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

    pub fn pending_notifications(&self) -> &[RpcNotification] {
        &self.outgoing_notifications
    }

    pub fn pending_responses(&self) -> &[RpcResponse] {
        &self.outgoing_responses
    }
}

/// Plugin establishing WebRPC communication layer for iframe-based deployment.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .init_resource::<HostInbox>()
            .add_event::<IncomingRpcMessage>()
            .add_systems(
                Update,
                (
                    drain_host_inbox,
                    handle_rpc_messages,
                    notify_settings_changed,
                    flush_outgoing,
                )
                    .chain(),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, listen_for_host_messages)
            .add_systems(Update, forward_capture_commands.before(flush_outgoing));
    }
}

/// Raw JSON-RPC strings posted by the host, shared with the `message` listener.
#[derive(Resource, Clone, Default)]
struct HostInbox(Arc<Mutex<Vec<String>>>);

impl HostInbox {
    #[cfg(target_arch = "wasm32")]
    fn push(&self, message: String) {
        if let Ok(mut pending) = self.0.lock() {
            pending.push(message);
        }
    }

    fn take(&self) -> Vec<String> {
        self.0
            .lock()
            .map(|mut pending| std::mem::take(&mut *pending))
            .unwrap_or_default()
    }
}

#[cfg(target_arch = "wasm32")]
fn listen_for_host_messages(inbox: Res<HostInbox>) {
    let inbox = inbox.clone();
    let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
        // Only string payloads that look like JSON-RPC are queued.
        let Ok(data) = event.data().dyn_into::<js_sys::JsString>() else {
            return;
        };
        let text: String = data.into();
        if text.contains("jsonrpc") {
            inbox.push(text);
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    let Some(window) = window() else {
        error!("No window to listen on for host messages");
        return;
    };
    if let Err(e) =
        window.add_event_listener_with_callback("message", on_message.as_ref().unchecked_ref())
    {
        error!("Failed to register message listener: {:?}", e);
    }
    // The listener lives as long as the page.
    on_message.forget();
}

/// Raw JSON-RPC message received from the host page.
#[derive(Event, Debug, Clone)]
pub struct IncomingRpcMessage {
    pub content: String,
}

fn drain_host_inbox(inbox: Res<HostInbox>, mut incoming: EventWriter<IncomingRpcMessage>) {
    incoming.write_batch(
        inbox
            .take()
            .into_iter()
            .map(|content| IncomingRpcMessage { content }),
    );
}

/// World access needed by the RPC methods.
#[derive(SystemParam)]
pub struct RpcContext<'w> {
    settings: ResMut<'w, ViewerSettings>,
    settings_changes: EventWriter<'w, SettingsChanged>,
    estimator: Res<'w, HeadPoseEstimator>,
    status: Res<'w, TrackingStatus>,
    avatar: Res<'w, AvatarPose>,
    avatar_resets: EventWriter<'w, AvatarResetRequest>,
    feed: Res<'w, DetectionFeed>,
    capture: ResMut<'w, CaptureSession>,
    diagnostics: Option<Res<'w, DiagnosticsStore>>,
}

pub fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut context: RpcContext,
) {
    for event in events.read() {
        match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => {
                debug!("Processing RPC method: {}", request.method);
                if let Some(response) = handle_rpc_request(&request, &mut context) {
                    rpc_interface.queue_response(response);
                }
            }
            Err(parse_error) => {
                warn!("Discarding malformed RPC message: {}", parse_error);
            }
        }
    }
}

/// Handle individual RPC message. Only requests with IDs get a response.
fn handle_rpc_request(request: &RpcRequest, context: &mut RpcContext) -> Option<RpcResponse> {
    let result = match request.method.as_str() {
        // Configuration surface
        "update_settings" => handle_update_settings(&request.params, context),
        "get_settings" => to_result(&*context.settings),
        // Tracking state
        "get_head_state" => to_result(&context.estimator.state()),
        "get_tracking_status" => to_result(&*context.status),
        // Locomotion
        "get_avatar_pose" => to_result(&*context.avatar),
        "reset_avatar" => handle_reset_avatar(&request.params, context),
        // Diagnostics
        "get_fps" => handle_get_fps(context.diagnostics.as_deref()),
        // Host-side detector and camera
        "detection_result" => handle_detection_result(&request.params, context),
        "detection_error" => handle_detection_error(&request.params, context),
        "capture_opened" => handle_capture_opened(&request.params, context),
        "capture_failed" => handle_capture_failed(&request.params, context),
        _ => {
            warn!("Unknown RPC method: {}", request.method);
            let id = request.id.clone()?;
            return Some(create_error_response(
                id,
                -32601,
                "Method not found",
                Some(serde_json::json!({"method": request.method})),
            ));
        }
    };

    // Notifications have no ID; failures are only logged.
    let Some(id) = request.id.clone() else {
        if let Err(error) = result {
            warn!("RPC notification {} failed: {}", request.method, error.message);
        }
        return None;
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

fn to_result<T: Serialize>(value: &T) -> Result<serde_json::Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::internal_error(&e.to_string()))
}

/// Merge a partial settings record through the single settings entry point.
fn handle_update_settings(
    params: &serde_json::Value,
    context: &mut RpcContext,
) -> Result<serde_json::Value, RpcError> {
    let patch = serde_json::from_value::<SettingsPatch>(params.clone())
        .map_err(|e| RpcError::invalid_params(&format!("Invalid settings: {e}")))?;

    let changed = update_settings(&mut context.settings, patch, &mut context.settings_changes)?;

    Ok(serde_json::json!({
        "success": true,
        "changed": changed,
    }))
}

fn handle_reset_avatar(
    params: &serde_json::Value,
    context: &mut RpcContext,
) -> Result<serde_json::Value, RpcError> {
    #[derive(Deserialize)]
    #[serde(default)]
    struct ResetParams {
        position: bool,
        rotation: bool,
    }

    impl Default for ResetParams {
        fn default() -> Self {
            Self {
                position: true,
                rotation: true,
            }
        }
    }

    let reset = if params.is_null() {
        ResetParams::default()
    } else {
        serde_json::from_value::<ResetParams>(params.clone())
            .map_err(|_| RpcError::invalid_params("Expected boolean 'position' and 'rotation'"))?
    };

    context.avatar_resets.write(AvatarResetRequest {
        position: reset.position,
        rotation: reset.rotation,
    });

    Ok(serde_json::json!({ "success": true }))
}

/// Handle FPS retrieval with diagnostic system integration.
fn handle_get_fps(diagnostics: Option<&DiagnosticsStore>) -> Result<serde_json::Value, RpcError> {
    let fps = diagnostics.and_then(smoothed_fps).unwrap_or(0.0) as f32;

    Ok(serde_json::json!({
        "fps": fps
    }))
}

fn handle_detection_result(
    params: &serde_json::Value,
    context: &mut RpcContext,
) -> Result<serde_json::Value, RpcError> {
    let frame = serde_json::from_value::<DetectorFrame>(params.clone())
        .map_err(|e| RpcError::invalid_params(&format!("Invalid detection: {e}")))?;
    context.feed.push(frame);
    Ok(serde_json::json!({ "accepted": true }))
}

fn handle_detection_error(
    params: &serde_json::Value,
    context: &mut RpcContext,
) -> Result<serde_json::Value, RpcError> {
    let message = params
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("detector failed");
    context.feed.push_error(message);
    Ok(serde_json::json!({ "accepted": true }))
}

fn handle_capture_opened(
    params: &serde_json::Value,
    context: &mut RpcContext,
) -> Result<serde_json::Value, RpcError> {
    #[derive(Deserialize)]
    struct OpenedParams {
        generation: u64,
        width: u32,
        height: u32,
    }

    let opened = serde_json::from_value::<OpenedParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'generation', 'width' and 'height'"))?;
    context
        .capture
        .on_opened(opened.generation, opened.width, opened.height)?;
    Ok(serde_json::json!({ "success": true }))
}

fn handle_capture_failed(
    params: &serde_json::Value,
    context: &mut RpcContext,
) -> Result<serde_json::Value, RpcError> {
    #[derive(Deserialize)]
    struct FailedParams {
        generation: u64,
        #[serde(default)]
        reason: String,
        #[serde(default)]
        permission_denied: bool,
    }

    let failed = serde_json::from_value::<FailedParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'generation' parameter"))?;
    let error = if failed.permission_denied {
        ViewerError::PermissionDenied
    } else {
        ViewerError::CaptureUnavailable(failed.reason)
    };
    context.capture.on_failed(failed.generation, &error);
    Ok(serde_json::json!({ "success": true }))
}

/// Tell the host which settings changed and what they are now.
fn notify_settings_changed(
    mut changes: EventReader<SettingsChanged>,
    settings: Res<ViewerSettings>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    let changed: Vec<&str> = changes
        .read()
        .flat_map(|change| change.changed.iter().copied())
        .collect();
    if changed.is_empty() {
        return;
    }
    rpc_interface.send_notification(
        "settings_changed",
        serde_json::json!({
            "changed": changed,
            "settings": &*settings,
        }),
    );
}

/// The host page owns the webcam on the web: hand it the capture commands.
#[cfg(target_arch = "wasm32")]
fn forward_capture_commands(
    mut capture: ResMut<CaptureSession>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    use crate::tracking::capture::CaptureCommand;

    for command in capture.take_commands() {
        let method = match command {
            CaptureCommand::Open { .. } => "capture_request",
            CaptureCommand::Release { .. } => "capture_release",
        };
        match serde_json::to_value(command) {
            Ok(params) => rpc_interface.send_notification(method, params),
            Err(e) => error!("Failed to serialise capture command: {}", e),
        }
    }
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

/// Post everything queued this frame: notifications, then responses.
fn flush_outgoing(mut rpc_interface: ResMut<WebRpcInterface>) {
    let interface = &mut *rpc_interface;
    let notifications = interface.outgoing_notifications.drain(..).map(|n| post_to_host(&n));
    let responses = interface.outgoing_responses.drain(..).map(|r| post_to_host(&r));
    for outcome in notifications.chain(responses) {
        if let Err(e) = outcome {
            error!("Failed to post message to host: {}", e);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn post_to_host<T: Serialize>(message: &T) -> Result<(), String> {
    let json = serde_json::to_string(message).map_err(|e| e.to_string())?;
    let parent = window()
        .ok_or("window object not available")?
        .parent()
        .ok()
        .flatten()
        .ok_or("no parent window")?;
    parent
        .post_message(&JsValue::from_str(&json), "*")
        .map_err(|e| format!("{e:?}"))
}

/// Native builds have no host page.
#[cfg(not(target_arch = "wasm32"))]
fn post_to_host<T: Serialize>(_message: &T) -> Result<(), String> {
    Ok(())
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

impl From<ViewerError> for RpcError {
    fn from(error: ViewerError) -> Self {
        match error {
            ViewerError::InvalidSettings(_) | ViewerError::InvalidInput(_) | ViewerError::Json(_) => {
                Self::invalid_params(&error.to_string())
            }
            _ => Self::internal_error(&error.to_string()),
        }
    }
}
