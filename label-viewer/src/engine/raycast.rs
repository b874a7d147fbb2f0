use bevy::prelude::*;
use bevy::render::view::RenderLayers;

use crate::engine::camera::viewer_camera::ViewerCamera;
use crate::engine::scene::drawable::{Layered, Posed};
use crate::engine::scene::registry::SharedDrawable;
use crate::state::settings::ViewerSettings;
use crate::state::snapshot::LabelId;

/// Range and tolerance of a pick ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastParams {
    pub near: f32,
    pub far: f32,
    /// Max distance between the ray and a line drawable that still counts as a hit.
    pub line_precision: f32,
}

impl RaycastParams {
    pub fn from_settings(settings: &ViewerSettings) -> Self {
        Self {
            near: settings.ray_near,
            far: settings.ray_far,
            line_precision: settings.line_precision,
        }
    }

    pub fn in_range(&self, distance: f32) -> bool {
        distance >= self.near && distance <= self.far
    }
}

impl Default for RaycastParams {
    fn default() -> Self {
        Self::from_settings(&ViewerSettings::default())
    }
}

/// Nearest intersection of a pick ray with a label drawable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelHit {
    pub label: LabelId,
    pub distance: f32,
    pub point: Vec3,
}

/// Cast through `ndc` from `camera` against `objects`.
///
/// The camera's world transform is refreshed first. Never touches application state.
pub fn cast_from_camera(
    camera: &mut ViewerCamera,
    ndc: Vec2,
    objects: &[SharedDrawable],
    params: &RaycastParams,
) -> Option<LabelHit> {
    camera.update_world_transform();
    let ray = camera.ndc_to_ray(ndc)?;
    nearest_hit(ray, camera.layers(), objects, params)
}

/// Closest hit along `ray` among objects sharing a layer with `layers`.
///
/// Objects are visited in the given order and only a strictly closer hit
/// replaces the current best, so equal distances resolve to the earliest object.
pub fn nearest_hit(
    ray: Ray3d,
    layers: &RenderLayers,
    objects: &[SharedDrawable],
    params: &RaycastParams,
) -> Option<LabelHit> {
    let mut best: Option<LabelHit> = None;
    for object in objects {
        let Ok(mut drawable) = object.try_borrow_mut() else {
            continue;
        };
        if !drawable.layers().intersects(layers) {
            continue;
        }
        drawable.update_world_transform();
        let Some(distance) = drawable.ray_distance(ray, params) else {
            continue;
        };
        if !params.in_range(distance) {
            continue;
        }
        if best.is_none_or(|hit| distance < hit.distance) {
            best = Some(LabelHit {
                label: drawable.label_id(),
                distance,
                point: ray.get_point(distance),
            });
        }
    }
    best
}

/// Distance along `ray` to an oriented box of `size` centred on `world`.
pub fn ray_hits_obb(ray: Ray3d, world: &GlobalTransform, size: Vec3) -> Option<f32> {
    let inv = world.compute_matrix().inverse();
    let origin = inv.transform_point3(ray.origin);
    let direction = inv.transform_vector3(ray.direction.as_vec3());
    let half = size * 0.5;
    ray_aabb_hit_t(origin, direction, -half, half)
}

// Slab-method ray–AABB intersection, returns Some(t) or None
pub fn ray_aabb_hit_t(ray_origin: Vec3, ray_direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut tmin = f32::NEG_INFINITY;
    let mut tmax = f32::INFINITY;

    for axis in 0..3 {
        let (o, d) = (ray_origin[axis], ray_direction[axis]);
        if d == 0.0 {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let mut t0 = (min[axis] - o) / d;
        let mut t1 = (max[axis] - o) / d;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        tmin = tmin.max(t0);
        tmax = tmax.min(t1);
        if tmin > tmax {
            return None;
        }
    }

    if tmax < 0.0 {
        return None;
    }
    Some(if tmin >= 0.0 { tmin } else { tmax })
}

/// Distance along `ray` to a `size` rectangle on the local XY plane of `world`.
pub fn ray_hits_rect(ray: Ray3d, world: &GlobalTransform, size: Vec2) -> Option<f32> {
    let inv = world.compute_matrix().inverse();
    let origin = inv.transform_point3(ray.origin);
    let direction = inv.transform_vector3(ray.direction.as_vec3());
    if direction.z.abs() < f32::EPSILON {
        return None;
    }
    let t = -origin.z / direction.z;
    if t < 0.0 {
        return None;
    }
    let point = origin + direction * t;
    let half = size * 0.5;
    (point.x.abs() <= half.x && point.y.abs() <= half.y).then_some(t)
}

/// Distance along `ray` to the point closest to segment `a`-`b`, when the
/// gap between ray and segment is within `precision`.
pub fn ray_near_segment(ray: Ray3d, a: Vec3, b: Vec3, precision: f32) -> Option<f32> {
    let u = ray.direction.as_vec3();
    let v = b - a;
    let w = ray.origin - a;

    let uu = u.dot(u);
    let uv = u.dot(v);
    let vv = v.dot(v);
    let uw = u.dot(w);
    let vw = v.dot(w);

    // Degenerate segment: measure against its start point.
    if vv < f32::EPSILON {
        let s = (-uw / uu).max(0.0);
        let gap = (ray.origin + u * s).distance(a);
        return (gap <= precision).then_some(s);
    }

    let denom = uu * vv - uv * uv;
    let mut s = if denom > f32::EPSILON {
        (uv * vw - vv * uw) / denom
    } else {
        0.0
    };
    s = s.max(0.0);
    let t = ((s * uv + vw) / vv).clamp(0.0, 1.0);
    s = ((t * uv - uw) / uu).max(0.0);

    let gap = (ray.origin + u * s).distance(a + v * t);
    (gap <= precision).then_some(s)
}
