use bevy::prelude::*;
use bevy::render::view::RenderLayers;
use constants::coordinate_system::SENSOR_TO_CAMERA;

use crate::engine::scene::drawable::{Layered, Posed};
use crate::state::settings::ViewerSettings;
use crate::state::snapshot::{Extrinsics, Intrinsics};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraKind {
    Generic,
    Intrinsic,
}

impl CameraKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Intrinsic => "intrinsic",
        }
    }
}

/// Projection of a viewer camera. Both variants produce OpenGL-style clip
/// space (`z` in `[-1, 1]`), camera looking down its local -Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraProjection {
    Perspective {
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    /// Pinhole projection reconstructed from sensor intrinsics and the pixel
    /// size of the loaded image.
    Intrinsic {
        focal: Vec2,
        center: Vec2,
        image_size: Vec2,
        near: f32,
        far: f32,
    },
}

impl CameraProjection {
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Self::Perspective { fov_y, aspect, near, far } => {
                Mat4::perspective_rh_gl(fov_y, aspect, near, far)
            }
            Self::Intrinsic { focal, center, image_size, near, far } => {
                let left = -center.x * near / focal.x;
                let right = (image_size.x - center.x) * near / focal.x;
                let top = center.y * near / focal.y;
                let bottom = -(image_size.y - center.y) * near / focal.y;
                off_axis_frustum(left, right, bottom, top, near, far)
            }
        }
    }
}

fn off_axis_frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let sx = 2.0 * near / (right - left);
    let sy = 2.0 * near / (top - bottom);
    let a = (right + left) / (right - left);
    let b = (top + bottom) / (top - bottom);
    let c = -(far + near) / (far - near);
    let d = -2.0 * far * near / (far - near);
    Mat4::from_cols(
        Vec4::new(sx, 0.0, 0.0, 0.0),
        Vec4::new(0.0, sy, 0.0, 0.0),
        Vec4::new(a, b, c, -1.0),
        Vec4::new(0.0, 0.0, d, 0.0),
    )
}

/// The camera a viewer renders and picks with.
///
/// Cameras are never parented, so the world transform is refreshed explicitly
/// with [`Posed::update_world_transform`] before it is read for picking.
#[derive(Debug, Clone)]
pub struct ViewerCamera {
    pub projection: CameraProjection,
    pub transform: Transform,
    world: GlobalTransform,
    layers: RenderLayers,
    generation: u64,
}

impl ViewerCamera {
    /// Fixed perspective camera with aspect 1.
    pub fn generic(settings: &ViewerSettings, generation: u64) -> Self {
        Self::with_projection(
            CameraProjection::Perspective {
                fov_y: settings.fov_degrees.to_radians(),
                aspect: constants::render_settings::GENERIC_ASPECT,
                near: settings.camera_near,
                far: settings.camera_far,
            },
            generation,
        )
    }

    /// Returns `None` for degenerate input: non-positive focal length or an empty image.
    pub fn intrinsic(
        intrinsics: &Intrinsics,
        image_size: UVec2,
        settings: &ViewerSettings,
        generation: u64,
    ) -> Option<Self> {
        let focal = intrinsics.focal();
        if image_size.x == 0 || image_size.y == 0 || focal.x <= 0.0 || focal.y <= 0.0 {
            return None;
        }
        Some(Self::with_projection(
            CameraProjection::Intrinsic {
                focal,
                center: intrinsics.center(),
                image_size: image_size.as_vec2(),
                near: settings.camera_near,
                far: settings.camera_far,
            },
            generation,
        ))
    }

    fn with_projection(projection: CameraProjection, generation: u64) -> Self {
        Self {
            projection,
            transform: Transform::IDENTITY,
            world: GlobalTransform::IDENTITY,
            layers: RenderLayers::layer(0),
            generation,
        }
    }

    pub fn kind(&self) -> CameraKind {
        match self.projection {
            CameraProjection::Perspective { .. } => CameraKind::Generic,
            CameraProjection::Intrinsic { .. } => CameraKind::Intrinsic,
        }
    }

    /// Increases every time the owning provider rebuilds its camera.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_aspect(&mut self, new_aspect: f32) {
        if let CameraProjection::Perspective { aspect, .. } = &mut self.projection {
            if new_aspect.is_finite() && new_aspect > 0.0 {
                *aspect = new_aspect;
            }
        }
    }

    /// Anchor the camera to a sensor pose.
    ///
    /// Position is zeroed, the sensor rotation loaded, the half turn about
    /// local X composed on top, and only then is the translation set.
    pub fn apply_extrinsics(&mut self, extrinsics: &Extrinsics) {
        self.transform.translation = Vec3::ZERO;
        self.transform.rotation = extrinsics.rotation();
        self.transform.rotation = self.transform.rotation * SENSOR_TO_CAMERA;
        self.transform.translation = extrinsics.translation();
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection.matrix() * self.world.compute_matrix().inverse()
    }

    /// Pick ray through `ndc`, from the camera's world position towards the
    /// matching point on the far clip plane. Uses the last refreshed world transform.
    pub fn ndc_to_ray(&self, ndc: Vec2) -> Option<Ray3d> {
        let inverse = self.view_projection().inverse();
        let far = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        let origin = self.world.translation();
        let direction = Dir3::new(far - origin).ok()?;
        Some(Ray3d::new(origin, direction))
    }
}

impl Posed for ViewerCamera {
    fn local_transform(&self) -> Transform {
        self.transform
    }

    fn world_transform(&self) -> GlobalTransform {
        self.world
    }

    fn update_world_transform(&mut self) {
        self.world = GlobalTransform::from(self.transform);
    }
}

impl Layered for ViewerCamera {
    fn layers(&self) -> &RenderLayers {
        &self.layers
    }

    fn set_layers(&mut self, layers: RenderLayers) {
        self.layers = layers;
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use super::*;

    fn intrinsics(width: f32, height: f32) -> Intrinsics {
        Intrinsics {
            focal_length: [500.0, 500.0],
            principal_point: [width / 2.0, height / 2.0],
        }
    }

    #[test]
    fn generic_camera_defaults() {
        let camera = ViewerCamera::generic(&ViewerSettings::default(), 0);
        assert_eq!(camera.kind(), CameraKind::Generic);
        match camera.projection {
            CameraProjection::Perspective { fov_y, aspect, near, far } => {
                assert!((fov_y - 45f32.to_radians()).abs() < 1e-6);
                assert_eq!(aspect, 1.0);
                assert_eq!(near, 0.1);
                assert_eq!(far, 1000.0);
            }
            CameraProjection::Intrinsic { .. } => panic!("expected perspective"),
        }
    }

    #[test]
    fn extrinsics_compose_rotation_before_translation() {
        let mut camera = ViewerCamera::generic(&ViewerSettings::default(), 0);
        camera.transform.translation = Vec3::new(9.0, 9.0, 9.0);
        let extrinsics = Extrinsics { rotation: [0.0, 0.0, 0.0, 1.0], translation: [1.0, 2.0, 3.0] };

        camera.apply_extrinsics(&extrinsics);

        assert!(camera.transform.translation.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-6));
        assert!(camera.transform.rotation.abs_diff_eq(Quat::from_rotation_x(PI), 1e-6));
    }

    #[test]
    fn extrinsics_correction_is_applied_in_local_frame() {
        let mut camera = ViewerCamera::generic(&ViewerSettings::default(), 0);
        let sensor = Quat::from_rotation_y(PI / 2.0);
        let extrinsics = Extrinsics { rotation: sensor.to_array(), translation: [0.0; 3] };

        camera.apply_extrinsics(&extrinsics);

        let expected = sensor * Quat::from_rotation_x(PI);
        assert!(camera.transform.rotation.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn generic_centre_ray_looks_down_negative_z() {
        let mut camera = ViewerCamera::generic(&ViewerSettings::default(), 0);
        camera.transform.translation = Vec3::new(0.0, 0.0, 5.0);
        camera.update_world_transform();

        let ray = camera.ndc_to_ray(Vec2::ZERO).unwrap();

        assert!(ray.origin.abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-5));
        assert!(ray.direction.as_vec3().abs_diff_eq(Vec3::NEG_Z, 1e-4));
    }

    #[test]
    fn ray_uses_refreshed_world_transform_only() {
        let mut camera = ViewerCamera::generic(&ViewerSettings::default(), 0);
        camera.transform.translation = Vec3::new(3.0, 0.0, 0.0);

        let stale = camera.ndc_to_ray(Vec2::ZERO).unwrap();
        camera.update_world_transform();
        let fresh = camera.ndc_to_ray(Vec2::ZERO).unwrap();

        assert!(stale.origin.abs_diff_eq(Vec3::ZERO, 1e-5));
        assert!(fresh.origin.abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn intrinsic_camera_looks_along_sensor_forward() {
        let settings = ViewerSettings::default();
        let mut camera =
            ViewerCamera::intrinsic(&intrinsics(640.0, 480.0), UVec2::new(640, 480), &settings, 1)
                .unwrap();
        camera.apply_extrinsics(&Extrinsics { rotation: [0.0, 0.0, 0.0, 1.0], translation: [0.0; 3] });
        camera.update_world_transform();

        let ray = camera.ndc_to_ray(Vec2::ZERO).unwrap();

        assert!(ray.direction.as_vec3().abs_diff_eq(Vec3::Z, 1e-4));
    }

    #[test]
    fn intrinsic_projection_maps_pixels_to_ndc() {
        let settings = ViewerSettings::default();
        let camera = ViewerCamera::intrinsic(
            &Intrinsics { focal_length: [400.0, 300.0], principal_point: [250.0, 180.0] },
            UVec2::new(640, 480),
            &settings,
            1,
        )
        .unwrap();
        let (u, v) = (100.0_f32, 400.0_f32);
        // Camera-frame point at depth 1 seen at pixel (u, v).
        let point = Vec3::new((u - 250.0) / 400.0, -(v - 180.0) / 300.0, -1.0);

        let ndc = camera.projection.matrix().project_point3(point);

        assert!((ndc.x - (2.0 * u / 640.0 - 1.0)).abs() < 1e-4);
        assert!((ndc.y - (1.0 - 2.0 * v / 480.0)).abs() < 1e-4);
    }

    #[test]
    fn degenerate_intrinsics_are_rejected() {
        let settings = ViewerSettings::default();
        assert!(ViewerCamera::intrinsic(&intrinsics(0.0, 0.0), UVec2::ZERO, &settings, 1).is_none());
        let flat = Intrinsics { focal_length: [0.0, 500.0], principal_point: [10.0, 10.0] };
        assert!(ViewerCamera::intrinsic(&flat, UVec2::new(20, 20), &settings, 1).is_none());
    }

    #[test]
    fn aspect_only_changes_perspective_cameras() {
        let settings = ViewerSettings::default();
        let mut generic = ViewerCamera::generic(&settings, 0);
        generic.set_aspect(2.0);
        assert!(matches!(generic.projection, CameraProjection::Perspective { aspect, .. } if aspect == 2.0));

        generic.set_aspect(0.0);
        assert!(matches!(generic.projection, CameraProjection::Perspective { aspect, .. } if aspect == 2.0));

        let mut intrinsic =
            ViewerCamera::intrinsic(&intrinsics(64.0, 48.0), UVec2::new(64, 48), &settings, 1).unwrap();
        let before = intrinsic.projection;
        intrinsic.set_aspect(3.0);
        assert_eq!(intrinsic.projection, before);
    }
}
