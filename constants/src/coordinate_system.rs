use bevy::math::Quat;

/// Rotation applied after a sensor's extrinsic rotation so the camera looks
/// down its own -Z axis. Sensor frames look down +Z with +Y pointing down;
/// a half turn about local X maps one convention onto the other.
///
/// Quaternion (x, y, z, w) = (1, 0, 0, 0), i.e. 180° about X.
pub const SENSOR_TO_CAMERA: Quat = Quat::from_xyzw(1.0, 0.0, 0.0, 0.0);

/// Default up axis for orbit poses that do not name one.
pub const DEFAULT_UP: [f32; 3] = [0.0, 1.0, 0.0];
