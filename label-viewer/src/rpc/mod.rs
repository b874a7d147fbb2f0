//! JSON-RPC 2.0 bridge between the embedding page and the viewers.
//!
//! The viewer runs inside an iframe; the host page drives it with
//! `postMessage` requests and receives replies and notifications the same way.
//!
//! ```text
//! Host page (parent window)  <──postMessage──>  viewer (iframe)
//!        │                                          │
//!        ├─ Request (with ID) ────────────────────> │
//!        │                                          ├─ mutate store
//!        │ <─────────────────── Response (with ID) ─┤
//!        │ <──────── state_changed notification ────┤
//! ```
//!
//! ## Methods
//!
//! - `push_snapshot`: replace the application snapshot (params: the snapshot)
//! - `set_active_viewer`: `{ "viewer": id | null }`
//! - `set_frozen`: `{ "frozen": bool }`
//! - `get_viewer_status`: `{ "viewer": id }` returns phase, camera kind, layer
//!
//! ## Error Handling
//!
//! Standard JSON-RPC 2.0 error codes:
//! - `-32600`: Invalid request
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error

/// Request handling, outgoing queues and the wasm message listener.
pub mod web_rpc;
