//! Numeric constants shared by the label viewer crates.

/// Sensor-to-camera axis conventions.
pub mod coordinate_system;

/// Generic camera and raycast parameters.
pub mod render_settings;

/// Zoom limits for image-with-intrinsics viewers.
pub mod view_scale;
