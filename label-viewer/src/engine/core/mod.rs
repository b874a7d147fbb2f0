//! Viewer lifecycle phases and the shared application context.

/// Per-viewer phase machine driven by store notifications and surface lifecycle.
pub mod app_state;

/// Explicitly constructed context shared by every viewer.
pub mod context;
