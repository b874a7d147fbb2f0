/// Generic and intrinsics-derived cameras and their provider.
pub mod camera;
/// Viewer phase machine and the shared application context.
pub mod core;
/// Pick rays against label drawables.
pub mod raycast;
/// Label drawables and the shared registry.
pub mod scene;
