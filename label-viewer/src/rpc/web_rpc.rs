use std::rc::Rc;

use bevy::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::engine::core::context::AppContext;
use crate::error::ViewerError;
use crate::state::snapshot::{AppSnapshot, ViewerId};
use crate::viewer::Viewer;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::window;

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

/// JSON-RPC error structure following specification.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Bridge between the embedding page and the viewers.
///
/// Requests mutate the shared store; replies and notifications queue up
/// until [`ViewerRpc::flush`] posts them to the parent window.
pub struct ViewerRpc {
    ctx: Rc<AppContext>,
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl ViewerRpc {
    pub fn new(ctx: Rc<AppContext>) -> Self {
        Self {
            ctx,
            outgoing_notifications: Vec::new(),
            outgoing_responses: Vec::new(),
        }
    }

    /// Send notification to the host page without expecting response.
    pub fn send_notification(&mut self, method: &str, params: serde_json::Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }

    pub fn pending_notifications(&self) -> &[RpcNotification] {
        &self.outgoing_notifications
    }

    pub fn pending_responses(&self) -> &[RpcResponse] {
        &self.outgoing_responses
    }

    /// Parse and handle one raw message. `viewers` are the mounted viewers
    /// status queries can report on.
    pub fn handle_message(&mut self, content: &str, viewers: &[Viewer]) {
        match serde_json::from_str::<RpcRequest>(content) {
            Ok(request) => {
                if let Some(response) = self.handle_request(&request, viewers) {
                    self.queue_response(response);
                }
            }
            Err(parse_error) => {
                warn!("RPC parse error: {}", parse_error);
                self.send_notification(
                    "debug_message",
                    serde_json::json!({
                        "message": format!("Parse error: {}", parse_error)
                    }),
                );
            }
        }
    }

    /// Handle one request. Requests without an id are notifications and get no reply.
    pub fn handle_request(&mut self, request: &RpcRequest, viewers: &[Viewer]) -> Option<RpcResponse> {
        if request.jsonrpc != "2.0" {
            return request
                .id
                .clone()
                .map(|id| create_error_response(id, -32600, "Invalid request", None));
        }

        let result = match request.method.as_str() {
            "push_snapshot" => self.handle_push_snapshot(&request.params),
            "set_active_viewer" => self.handle_set_active_viewer(&request.params),
            "set_frozen" => self.handle_set_frozen(&request.params),
            "get_viewer_status" => self.handle_get_viewer_status(&request.params, viewers),
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

        let id = request.id.clone()?;
        Some(match result {
            Ok(result_value) => RpcResponse {
                jsonrpc: "2.0".to_string(),
                result: Some(result_value),
                error: None,
                id: Some(id),
            },
            Err(error) => RpcResponse {
                jsonrpc: "2.0".to_string(),
                result: None,
                error: Some(error),
                id: Some(id),
            },
        })
    }

    fn handle_push_snapshot(&mut self, params: &serde_json::Value) -> Result<serde_json::Value, RpcError> {
        let snapshot: AppSnapshot = parse_params(params)?;
        let version = self.ctx.store.replace(snapshot);
        self.notify_version(version);
        Ok(serde_json::json!({ "version": version }))
    }

    fn handle_set_active_viewer(&mut self, params: &serde_json::Value) -> Result<serde_json::Value, RpcError> {
        #[derive(Deserialize)]
        struct ActiveViewerParams {
            viewer: Option<ViewerId>,
        }

        let parsed: ActiveViewerParams = parse_params(params)?;
        if let Some(viewer) = parsed.viewer {
            if self.ctx.store.snapshot().viewer(viewer).is_none() {
                return Err(RpcError::from(ViewerError::UnknownViewer(viewer)));
            }
        }
        let version = self.ctx.store.dispatch(|snapshot| snapshot.session.active_viewer = parsed.viewer);
        info!("Active viewer set: {:?}", parsed.viewer);
        self.notify_version(version);
        Ok(serde_json::json!({
            "success": true,
            "active_viewer": parsed.viewer
        }))
    }

    fn handle_set_frozen(&mut self, params: &serde_json::Value) -> Result<serde_json::Value, RpcError> {
        #[derive(Deserialize)]
        struct FrozenParams {
            frozen: bool,
        }

        let parsed: FrozenParams = parse_params(params)?;
        let version = self.ctx.store.dispatch(|snapshot| snapshot.session.frozen = parsed.frozen);
        self.notify_version(version);
        Ok(serde_json::json!({
            "success": true,
            "frozen": parsed.frozen
        }))
    }

    fn handle_get_viewer_status(
        &mut self,
        params: &serde_json::Value,
        viewers: &[Viewer],
    ) -> Result<serde_json::Value, RpcError> {
        #[derive(Deserialize)]
        struct StatusParams {
            viewer: ViewerId,
        }

        let parsed: StatusParams = parse_params(params)?;
        let viewer = viewers
            .iter()
            .find(|viewer| viewer.id() == parsed.viewer)
            .ok_or_else(|| RpcError::from(ViewerError::UnknownViewer(parsed.viewer)))?;

        Ok(serde_json::json!({
            "viewer": parsed.viewer,
            "phase": viewer.phase().as_str(),
            "camera": viewer.camera_kind().as_str(),
            "generation": viewer.camera().generation(),
            "layer": viewer.layer(),
            "active": self.ctx.active_viewer() == Some(parsed.viewer),
            "frozen": self.ctx.is_frozen(),
        }))
    }

    fn notify_version(&mut self, version: u64) {
        self.send_notification("state_changed", serde_json::json!({ "version": version }));
    }

    /// Send queued notifications, then responses, to the parent window.
    pub fn flush(&mut self) -> usize {
        let mut sent = 0;
        for notification in self.outgoing_notifications.drain(..) {
            send_message_to_parent(&notification);
            sent += 1;
        }
        for response in self.outgoing_responses.drain(..) {
            send_message_to_parent(&response);
            sent += 1;
        }
        sent
    }
}

/// Window `message` listener collecting JSON-RPC strings from the host page.
/// The listener is removed when this value is dropped.
#[cfg(target_arch = "wasm32")]
pub struct RpcMessageListener {
    queue: Rc<std::cell::RefCell<Vec<String>>>,
    closure: wasm_bindgen::closure::Closure<dyn FnMut(web_sys::MessageEvent)>,
}

#[cfg(target_arch = "wasm32")]
impl RpcMessageListener {
    pub fn install() -> crate::error::Result<Self> {
        use wasm_bindgen::JsCast;
        use wasm_bindgen::closure::Closure;

        let queue: Rc<std::cell::RefCell<Vec<String>>> = Rc::default();
        let queue_clone = queue.clone();

        let closure = Closure::wrap(Box::new(move |event: web_sys::MessageEvent| {
            // Filter messages to ensure they contain string data.
            if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
                let message_str: String = data.into();
                if message_str.contains("jsonrpc") {
                    queue_clone.borrow_mut().push(message_str);
                }
            }
        }) as Box<dyn FnMut(web_sys::MessageEvent)>);

        let window = window().ok_or_else(|| ViewerError::Surface("window unavailable".into()))?;
        window
            .add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
            .map_err(|e| ViewerError::Surface(format!("message listener: {:?}", e)))?;

        Ok(Self { queue, closure })
    }

    /// Feed every queued message to `rpc`, then flush its replies.
    pub fn pump(&self, rpc: &mut ViewerRpc, viewers: &[Viewer]) {
        let messages = std::mem::take(&mut *self.queue.borrow_mut());
        for message in messages {
            rpc.handle_message(&message, viewers);
        }
        rpc.flush();
    }
}

#[cfg(target_arch = "wasm32")]
impl Drop for RpcMessageListener {
    fn drop(&mut self) {
        use wasm_bindgen::JsCast;

        if let Some(window) = window() {
            let _ = window.remove_event_listener_with_callback("message", self.closure.as_ref().unchecked_ref());
        }
    }
}

fn parse_params<T: DeserializeOwned>(params: &serde_json::Value) -> Result<T, RpcError> {
    serde_json::from_value(params.clone()).map_err(|e| RpcError::from(ViewerError::from(e)))
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

/// Send serialized message to parent window (host page).
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

impl From<ViewerError> for RpcError {
    fn from(err: ViewerError) -> Self {
        match err {
            ViewerError::InvalidJson(_) | ViewerError::UnknownViewer(_) => Self::invalid_params(&err.to_string()),
            _ => Self::internal_error(&err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::settings::ViewerSettings;
    use crate::state::snapshot::{SensorId, ViewerConfig};
    use crate::tools::selection::SelectionHandler;

    fn context() -> Rc<AppContext> {
        let mut snapshot = AppSnapshot::default();
        snapshot
            .viewers
            .insert(1, ViewerConfig::Generic3d { sensor: SensorId(0), orbit: None });
        AppContext::new(snapshot, ViewerSettings::default())
    }

    fn request(method: &str, params: serde_json::Value) -> String {
        serde_json::json!({"jsonrpc": "2.0", "method": method, "params": params, "id": 1}).to_string()
    }

    #[test]
    fn set_active_viewer_updates_session() {
        let ctx = context();
        let mut rpc = ViewerRpc::new(ctx.clone());

        rpc.handle_message(&request("set_active_viewer", serde_json::json!({"viewer": 1})), &[]);

        assert_eq!(ctx.active_viewer(), Some(1));
        let response = &rpc.pending_responses()[0];
        assert!(response.error.is_none());
        assert_eq!(rpc.pending_notifications()[0].method, "state_changed");
    }

    #[test]
    fn unknown_viewer_is_invalid_params() {
        let mut rpc = ViewerRpc::new(context());

        rpc.handle_message(&request("set_active_viewer", serde_json::json!({"viewer": 9})), &[]);

        let error = rpc.pending_responses()[0].error.as_ref().unwrap();
        assert_eq!(error.code, -32602);
    }

    #[test]
    fn unknown_method_and_bad_version_are_rejected() {
        let mut rpc = ViewerRpc::new(context());

        rpc.handle_message(&request("fly", serde_json::json!({})), &[]);
        rpc.handle_message(r#"{"jsonrpc":"1.0","method":"set_frozen","params":{},"id":2}"#, &[]);

        let codes: Vec<_> = rpc
            .pending_responses()
            .iter()
            .map(|response| response.error.as_ref().map(|e| e.code))
            .collect();
        assert_eq!(codes, vec![Some(-32601), Some(-32600)]);
    }

    #[test]
    fn notifications_without_id_get_no_response() {
        let ctx = context();
        let mut rpc = ViewerRpc::new(ctx.clone());

        rpc.handle_message(r#"{"jsonrpc":"2.0","method":"set_frozen","params":{"frozen":true}}"#, &[]);

        assert!(ctx.is_frozen());
        assert!(rpc.pending_responses().is_empty());
    }

    #[test]
    fn push_snapshot_replaces_state() {
        let ctx = context();
        let mut rpc = ViewerRpc::new(ctx.clone());
        let params = serde_json::json!({
            "viewers": {"4": {"type": "point_cloud", "sensor": 2}},
            "session": {"active_viewer": 4}
        });

        rpc.handle_message(&request("push_snapshot", params), &[]);

        let snapshot = ctx.store.snapshot();
        assert!(snapshot.viewer(4).is_some());
        assert!(snapshot.viewer(1).is_none());
        assert_eq!(ctx.active_viewer(), Some(4));
        assert_eq!(rpc.flush(), 2);
        assert!(rpc.pending_responses().is_empty());
    }

    #[test]
    fn malformed_json_sends_debug_notification() {
        let mut rpc = ViewerRpc::new(context());

        rpc.handle_message("{not json", &[]);

        assert!(rpc.pending_responses().is_empty());
        assert_eq!(rpc.pending_notifications()[0].method, "debug_message");
    }

    #[test]
    fn status_reports_mounted_viewer() {
        let ctx = context();
        let viewers = vec![Viewer::mount(&ctx, 1, Box::new(SelectionHandler::new()))];
        let mut rpc = ViewerRpc::new(ctx.clone());

        rpc.handle_message(&request("get_viewer_status", serde_json::json!({"viewer": 1})), &viewers);

        let result = rpc.pending_responses()[0].result.clone().unwrap();
        assert_eq!(result["phase"], "uninitialized");
        assert_eq!(result["camera"], "generic");
        assert_eq!(result["layer"], 0);
        assert_eq!(result["active"], false);
    }
}
