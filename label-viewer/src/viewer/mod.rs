//! Viewer synchronization core.
//!
//! A [`Viewer`] owns one surface, its renderer and its camera. It re-reads the
//! store on every change notification, reconciles camera, layer and
//! visibility, and redraws. Pointer and key input is normalized to NDC and
//! routed to the label delegate.
//!
//! ```text
//! device event ─> canvas-local ─> NDC ─┬─> pick ray ─> nearest label hit
//!                                      └─> LabelHandler ─> consumed? ─> redraw
//! store change ─> phase ─> layer ─> camera reconcile ─> publish ─> redraw
//! ```

mod handle;
/// Layer rank of a viewer among the configured viewers.
pub mod layers;
/// Drawing surface and renderer seams, plus the canvas sizing policy.
pub mod surface;
mod sync;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use handle::Viewer;
pub use sync::EventOutcome;
