use constants::render_settings::{
    CAMERA_FAR, CAMERA_NEAR, GENERIC_FOV_DEGREES, LINE_PRECISION, RAY_FAR, RAY_NEAR,
};
use constants::view_scale::{MAX_SCALE, MIN_SCALE};
use serde::{Deserialize, Serialize};

/// Tunables shared by every viewer in an application context.
///
/// Partial JSON documents are accepted; omitted fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub fov_degrees: f32,
    pub camera_near: f32,
    pub camera_far: f32,
    pub ray_near: f32,
    pub ray_far: f32,
    pub line_precision: f32,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            fov_degrees: GENERIC_FOV_DEGREES,
            camera_near: CAMERA_NEAR,
            camera_far: CAMERA_FAR,
            ray_near: RAY_NEAR,
            ray_far: RAY_FAR,
            line_precision: LINE_PRECISION,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
        }
    }
}

impl ViewerSettings {
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether `scale` lies in `[min_scale, max_scale)`.
    pub fn scale_in_range(&self, scale: f32) -> bool {
        scale >= self.min_scale && scale < self.max_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings = ViewerSettings::from_json(r#"{ "ray_far": 250.0 }"#).unwrap();
        assert_eq!(settings.ray_far, 250.0);
        assert_eq!(settings.ray_near, RAY_NEAR);
        assert_eq!(settings.fov_degrees, 45.0);
        assert_eq!(settings.line_precision, 0.02);
    }

    #[test]
    fn scale_range_is_half_open() {
        let settings = ViewerSettings::default();
        assert!(settings.scale_in_range(MIN_SCALE));
        assert!(settings.scale_in_range(2.0));
        assert!(!settings.scale_in_range(MAX_SCALE));
        assert!(!settings.scale_in_range(0.5));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(ViewerSettings::from_json("{ ray_far: }").is_err());
    }
}
