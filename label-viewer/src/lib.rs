//! Interactive 3D annotation viewer core.
//!
//! Turns pointer and keyboard input on a viewer surface into scene-space
//! operations on label drawables, and keeps each viewer's camera, render
//! layer and visibility in step with a versioned application snapshot.
//!
//! ## Modules
//!
//! | Module   | Role |
//! |----------|------|
//! | `state`  | Snapshot schema, versioned store, notification channels, settings |
//! | `input`  | Device → canvas-local → NDC transforms, document keyboard source |
//! | `engine` | Cameras, drawables, shared scene registry, raycasting, viewer phases |
//! | `tools`  | Label interaction delegates |
//! | `viewer` | Per-viewer synchronization core and browser bindings |
//! | `rpc`    | JSON-RPC 2.0 bridge to the embedding page |
//!
//! ## Wiring
//!
//! ```rust,ignore
//! let ctx = AppContext::new(snapshot, ViewerSettings::default());
//! let viewer = Viewer::mount(&ctx, 0, Box::new(SelectionHandler::new()));
//! viewer.attach_surface(Box::new(HtmlCanvasSurface::new(canvas)));
//! ctx.store.dispatch(|s| s.session.active_viewer = Some(0));
//! ```

pub mod engine;
pub mod error;
pub mod input;
pub mod rpc;
pub mod state;
pub mod tools;
pub mod viewer;
