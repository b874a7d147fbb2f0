//! Viewer cameras and their reconciliation against the snapshot.
//!
//! A viewer renders through either a generic perspective camera or one
//! reconstructed from sensor intrinsics. [`provider::CameraProvider`] decides
//! which on every state change and keeps the pose anchored to the sensor.

/// Single-owner camera holder that rebuilds or re-poses on state changes.
pub mod provider;
/// Projection variants and the camera type shared with the delegate and registry.
pub mod viewer_camera;
