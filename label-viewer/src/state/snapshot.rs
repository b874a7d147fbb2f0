use std::collections::BTreeMap;

use bevy::prelude::*;
use constants::coordinate_system::DEFAULT_UP;
use serde::{Deserialize, Serialize};

pub type ViewerId = u32;
pub type LabelId = u64;

/// Logical camera or point-cloud source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorId(pub i32);

/// Optical parameters of a sensor, in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub focal_length: [f32; 2],
    pub principal_point: [f32; 2],
}

impl Intrinsics {
    pub fn focal(&self) -> Vec2 {
        Vec2::from_array(self.focal_length)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::from_array(self.principal_point)
    }
}

/// Sensor pose in world space. Rotation is stored as (x, y, z, w).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extrinsics {
    pub rotation: [f32; 4],
    pub translation: [f32; 3],
}

impl Extrinsics {
    /// Unit rotation; a zero quaternion reads as identity.
    pub fn rotation(&self) -> Quat {
        let q = Quat::from_array(self.rotation);
        if q.length_squared() <= f32::EPSILON {
            Quat::IDENTITY
        } else {
            q.normalize()
        }
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::from_array(self.translation)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    #[serde(default)]
    pub intrinsics: Option<Intrinsics>,
    #[serde(default)]
    pub extrinsics: Option<Extrinsics>,
}

/// Free camera pose used when a viewer's sensor carries no extrinsics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitPose {
    pub position: [f32; 3],
    pub target: [f32; 3],
    #[serde(default = "default_up")]
    pub up: [f32; 3],
}

fn default_up() -> [f32; 3] {
    DEFAULT_UP
}

fn default_view_scale() -> f32 {
    1.0
}

impl OrbitPose {
    pub fn transform(&self) -> Transform {
        Transform::from_translation(Vec3::from_array(self.position))
            .looking_at(Vec3::from_array(self.target), Vec3::from_array(self.up))
    }
}

/// Which kind of viewport a config describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKind {
    Generic3d,
    PointCloud,
    ImageWithIntrinsics,
}

/// Per-viewport configuration, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ViewerConfig {
    #[serde(rename = "generic_3d")]
    Generic3d {
        sensor: SensorId,
        #[serde(default)]
        orbit: Option<OrbitPose>,
    },
    #[serde(rename = "point_cloud")]
    PointCloud {
        sensor: SensorId,
        #[serde(default)]
        orbit: Option<OrbitPose>,
    },
    #[serde(rename = "image_with_intrinsics")]
    ImageWithIntrinsics {
        sensor: SensorId,
        #[serde(default = "default_view_scale")]
        view_scale: f32,
    },
}

impl ViewerConfig {
    pub fn sensor(&self) -> SensorId {
        match self {
            Self::Generic3d { sensor, .. }
            | Self::PointCloud { sensor, .. }
            | Self::ImageWithIntrinsics { sensor, .. } => *sensor,
        }
    }

    pub fn kind(&self) -> ViewerKind {
        match self {
            Self::Generic3d { .. } => ViewerKind::Generic3d,
            Self::PointCloud { .. } => ViewerKind::PointCloud,
            Self::ImageWithIntrinsics { .. } => ViewerKind::ImageWithIntrinsics,
        }
    }

    pub fn view_scale(&self) -> Option<f32> {
        match self {
            Self::ImageWithIntrinsics { view_scale, .. } => Some(*view_scale),
            Self::Generic3d { .. } | Self::PointCloud { .. } => None,
        }
    }

    pub fn orbit(&self) -> Option<&OrbitPose> {
        match self {
            Self::Generic3d { orbit, .. } | Self::PointCloud { orbit, .. } => orbit.as_ref(),
            Self::ImageWithIntrinsics { .. } => None,
        }
    }

    /// Whether the camera of this viewer is anchored to its sensor's pose.
    pub fn uses_extrinsics(&self) -> bool {
        matches!(self.kind(), ViewerKind::PointCloud | ViewerKind::ImageWithIntrinsics)
    }
}

/// Association of a label with the item and sensors it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    #[serde(default)]
    pub item: usize,
    /// Empty means visible from every sensor.
    #[serde(default)]
    pub sensors: Vec<SensorId>,
}

impl LabelRecord {
    pub fn visible_from(&self, sensor: SensorId) -> bool {
        self.sensors.is_empty() || self.sensors.contains(&sensor)
    }
}

/// A frame of the current item that has finished loading for a sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadedFrame {
    /// Pixel size of the decoded image; absent for point clouds or while decoding.
    #[serde(default)]
    pub image_size: Option<[u32; 2]>,
}

impl LoadedFrame {
    pub fn image_size(&self) -> Option<UVec2> {
        self.image_size.map(UVec2::from_array)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub active_viewer: Option<ViewerId>,
    #[serde(default)]
    pub current_item: usize,
    #[serde(default)]
    pub frozen: bool,
    #[serde(default)]
    pub read_only: bool,
}

impl SessionState {
    pub fn should_freeze(&self) -> bool {
        self.frozen || self.read_only
    }
}

/// Immutable application state at one version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSnapshot {
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub viewers: BTreeMap<ViewerId, ViewerConfig>,
    #[serde(default)]
    pub sensors: BTreeMap<SensorId, Sensor>,
    #[serde(default)]
    pub labels: BTreeMap<LabelId, LabelRecord>,
    /// Frames of the current item that are loaded, keyed by sensor.
    #[serde(default)]
    pub frames: BTreeMap<SensorId, LoadedFrame>,
    #[serde(default)]
    pub session: SessionState,
}

impl AppSnapshot {
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn viewer(&self, id: ViewerId) -> Option<&ViewerConfig> {
        self.viewers.get(&id)
    }

    pub fn sensor(&self, id: SensorId) -> Option<&Sensor> {
        self.sensors.get(&id)
    }

    pub fn frame(&self, sensor: SensorId) -> Option<&LoadedFrame> {
        self.frames.get(&sensor)
    }

    pub fn is_frame_loaded(&self, sensor: SensorId) -> bool {
        self.frames.contains_key(&sensor)
    }

    pub fn viewer_ids(&self) -> impl Iterator<Item = ViewerId> + '_ {
        self.viewers.keys().copied()
    }
}
