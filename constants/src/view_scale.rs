/// Smallest view scale that still triggers a canvas rescale (inclusive).
pub const MIN_SCALE: f32 = 1.0;

/// Upper bound on the view scale (exclusive).
pub const MAX_SCALE: f32 = 3.0;
