/// Vertical field of view of the generic perspective camera, in degrees.
pub const GENERIC_FOV_DEGREES: f32 = 45.0;

/// Aspect ratio the generic camera is created with.
pub const GENERIC_ASPECT: f32 = 1.0;

pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;

/// Hits closer than this along the pick ray are ignored.
pub const RAY_NEAR: f32 = 1.0;

/// Hits further than this along the pick ray are ignored.
pub const RAY_FAR: f32 = 100.0;

/// Distance within which a ray counts as touching a line drawable.
pub const LINE_PRECISION: f32 = 0.02;
