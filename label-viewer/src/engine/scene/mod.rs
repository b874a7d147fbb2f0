//! Shared label scene: drawable capabilities and the registry every viewer reads.

/// Capability traits and the concrete label drawables.
pub mod drawable;
/// Shared drawable collection, render snapshots and the published camera.
pub mod registry;
