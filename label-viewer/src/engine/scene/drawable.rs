use bevy::prelude::*;
use bevy::render::view::RenderLayers;

use crate::engine::raycast::{RaycastParams, ray_hits_obb, ray_hits_rect, ray_near_segment};
use crate::state::snapshot::LabelId;

/// Something with a local pose whose world transform can be refreshed on demand.
pub trait Posed {
    fn local_transform(&self) -> Transform;
    fn world_transform(&self) -> GlobalTransform;
    /// Recompute the world transform from the local one. Nothing propagates
    /// transforms automatically, so callers force this before reading.
    fn update_world_transform(&mut self);
}

/// Something a pick ray can hit.
pub trait Intersectable {
    /// Distance along `ray` to the nearest forward intersection.
    fn ray_distance(&self, ray: Ray3d, params: &RaycastParams) -> Option<f32>;
}

/// Membership in render layers. A viewer draws and picks only what shares its layer.
pub trait Layered {
    fn layers(&self) -> &RenderLayers;
    fn set_layers(&mut self, layers: RenderLayers);
}

/// A label's on-screen representation.
pub trait Drawable: Posed + Intersectable + Layered {
    fn label_id(&self) -> LabelId;
}

#[derive(Debug, Clone, Copy)]
struct Pose {
    local: Transform,
    world: GlobalTransform,
}

impl Pose {
    fn new(local: Transform) -> Self {
        Self { local, world: GlobalTransform::from(local) }
    }

    fn refresh(&mut self) {
        self.world = GlobalTransform::from(self.local);
    }
}

/// Oriented 3D box label.
#[derive(Debug, Clone)]
pub struct BoxLabel {
    label: LabelId,
    pose: Pose,
    pub size: Vec3,
    layers: RenderLayers,
}

impl BoxLabel {
    pub fn new(label: LabelId, transform: Transform, size: Vec3) -> Self {
        Self { label, pose: Pose::new(transform), size, layers: RenderLayers::none() }
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.pose.local = transform;
    }
}

/// Bounded rectangle on its local XY plane, e.g. a ground plane annotation.
#[derive(Debug, Clone)]
pub struct PlaneLabel {
    label: LabelId,
    pose: Pose,
    pub size: Vec2,
    layers: RenderLayers,
}

impl PlaneLabel {
    pub fn new(label: LabelId, transform: Transform, size: Vec2) -> Self {
        Self { label, pose: Pose::new(transform), size, layers: RenderLayers::none() }
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.pose.local = transform;
    }
}

/// Open polyline with points in local space.
#[derive(Debug, Clone)]
pub struct PolylineLabel {
    label: LabelId,
    pose: Pose,
    points: Vec<Vec3>,
    layers: RenderLayers,
}

impl PolylineLabel {
    pub fn new(label: LabelId, transform: Transform, points: Vec<Vec3>) -> Self {
        Self { label, pose: Pose::new(transform), points, layers: RenderLayers::none() }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn push_point(&mut self, point: Vec3) {
        self.points.push(point);
    }
}

impl Intersectable for BoxLabel {
    fn ray_distance(&self, ray: Ray3d, _params: &RaycastParams) -> Option<f32> {
        ray_hits_obb(ray, &self.pose.world, self.size)
    }
}

impl Intersectable for PlaneLabel {
    fn ray_distance(&self, ray: Ray3d, _params: &RaycastParams) -> Option<f32> {
        ray_hits_rect(ray, &self.pose.world, self.size)
    }
}

impl Intersectable for PolylineLabel {
    fn ray_distance(&self, ray: Ray3d, params: &RaycastParams) -> Option<f32> {
        let world = self.pose.world.compute_matrix();
        self.points
            .windows(2)
            .filter_map(|segment| {
                let a = world.transform_point3(segment[0]);
                let b = world.transform_point3(segment[1]);
                ray_near_segment(ray, a, b, params.line_precision)
            })
            .min_by(f32::total_cmp)
    }
}

macro_rules! impl_label_drawable {
    ($($ty:ty),+) => {$(
        impl Posed for $ty {
            fn local_transform(&self) -> Transform {
                self.pose.local
            }

            fn world_transform(&self) -> GlobalTransform {
                self.pose.world
            }

            fn update_world_transform(&mut self) {
                self.pose.refresh();
            }
        }

        impl Layered for $ty {
            fn layers(&self) -> &RenderLayers {
                &self.layers
            }

            fn set_layers(&mut self, layers: RenderLayers) {
                self.layers = layers;
            }
        }

        impl Drawable for $ty {
            fn label_id(&self) -> LabelId {
                self.label
            }
        }
    )+};
}

impl_label_drawable!(BoxLabel, PlaneLabel, PolylineLabel);

#[cfg(test)]
mod tests {
    use super::*;

    fn down_z() -> Ray3d {
        Ray3d::new(Vec3::new(0.0, 0.0, 10.0), Dir3::NEG_Z)
    }

    #[test]
    fn new_drawables_belong_to_no_layer() {
        let cube = BoxLabel::new(1, Transform::IDENTITY, Vec3::ONE);
        assert!(!cube.layers().intersects(&RenderLayers::layer(0)));
    }

    #[test]
    fn moved_box_needs_world_refresh() {
        let params = RaycastParams::default();
        let mut cube = BoxLabel::new(1, Transform::IDENTITY, Vec3::ONE);
        cube.set_transform(Transform::from_xyz(5.0, 0.0, 0.0));

        assert!(cube.ray_distance(down_z(), &params).is_some());
        cube.update_world_transform();
        assert!(cube.ray_distance(down_z(), &params).is_none());
    }

    #[test]
    fn plane_is_hit_within_bounds() {
        let plane = PlaneLabel::new(2, Transform::IDENTITY, Vec2::new(4.0, 2.0));
        let params = RaycastParams::default();

        assert!((plane.ray_distance(down_z(), &params).unwrap() - 10.0).abs() < 1e-5);
        let outside = Ray3d::new(Vec3::new(0.0, 1.5, 10.0), Dir3::NEG_Z);
        assert!(plane.ray_distance(outside, &params).is_none());
    }

    #[test]
    fn polyline_reports_closest_segment() {
        let params = RaycastParams::default();
        let mut line = PolylineLabel::new(
            3,
            Transform::from_xyz(0.0, 0.0, 2.0),
            vec![
                Vec3::new(-1.0, 0.0, -4.0),
                Vec3::new(1.0, 0.0, -4.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(-1.0, 0.0, 0.0),
            ],
        );
        line.update_world_transform();

        let distance = line.ray_distance(down_z(), &params).unwrap();

        // Segment at local z = 0 sits at world z = 2, eight units from the origin.
        assert!((distance - 8.0).abs() < 1e-4);
    }

    #[test]
    fn short_polyline_never_hits() {
        let line = PolylineLabel::new(4, Transform::IDENTITY, vec![Vec3::ZERO]);
        assert!(line.ray_distance(down_z(), &RaycastParams::default()).is_none());
    }
}
