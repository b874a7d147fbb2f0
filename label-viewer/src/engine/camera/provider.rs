use bevy::prelude::*;

use super::viewer_camera::{CameraKind, ViewerCamera};
use crate::engine::scene::drawable::{Layered, Posed};
use crate::state::settings::ViewerSettings;
use crate::state::snapshot::{AppSnapshot, Intrinsics, SensorId, ViewerConfig, ViewerKind};

/// Inputs an intrinsics-derived camera was built from. A change in any of
/// them forces a rebuild.
#[derive(Debug, Clone, Copy, PartialEq)]
struct IntrinsicKey {
    sensor: SensorId,
    intrinsics: Intrinsics,
    image_size: UVec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CameraChoice {
    Generic,
    Intrinsic(IntrinsicKey),
    /// Frame is loaded but its dimensions are not known yet.
    Retain,
}

/// What one reconciliation pass did to the camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub rebuilt: bool,
    pub posed: bool,
}

/// Owns the single active camera of a viewer and keeps it consistent with
/// the snapshot. There is always a camera; a rebuild replaces it atomically.
#[derive(Debug)]
pub struct CameraProvider {
    camera: ViewerCamera,
    key: Option<IntrinsicKey>,
    next_generation: u64,
}

impl CameraProvider {
    pub fn new(settings: &ViewerSettings) -> Self {
        Self {
            camera: ViewerCamera::generic(settings, 0),
            key: None,
            next_generation: 1,
        }
    }

    pub fn camera(&self) -> &ViewerCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut ViewerCamera {
        &mut self.camera
    }

    pub fn kind(&self) -> CameraKind {
        self.camera.kind()
    }

    /// Select the camera kind for `config`, rebuild if its inputs changed, then
    /// update the pose in place.
    pub fn reconcile(
        &mut self,
        config: &ViewerConfig,
        snapshot: &AppSnapshot,
        settings: &ViewerSettings,
    ) -> Reconciliation {
        let rebuilt = match choose(config, snapshot) {
            CameraChoice::Retain => false,
            CameraChoice::Generic => {
                if self.key.is_some() || self.camera.kind() != CameraKind::Generic {
                    self.rebuild_generic(settings);
                    true
                } else {
                    false
                }
            }
            CameraChoice::Intrinsic(key) if self.key == Some(key) => false,
            CameraChoice::Intrinsic(key) => {
                let generation = self.next_generation;
                match ViewerCamera::intrinsic(&key.intrinsics, key.image_size, settings, generation) {
                    Some(camera) => {
                        self.replace(camera);
                        self.key = Some(key);
                        info!(
                            "camera: built intrinsic camera for sensor {} ({}x{})",
                            key.sensor.0, key.image_size.x, key.image_size.y
                        );
                        true
                    }
                    None => {
                        warn!(
                            "camera: degenerate intrinsics for sensor {}, using generic camera",
                            key.sensor.0
                        );
                        if self.camera.kind() == CameraKind::Generic && self.key.is_none() {
                            false
                        } else {
                            self.rebuild_generic(settings);
                            true
                        }
                    }
                }
            }
        };

        let posed = self.update_pose(config, snapshot);
        Reconciliation { rebuilt, posed }
    }

    fn rebuild_generic(&mut self, settings: &ViewerSettings) {
        let camera = ViewerCamera::generic(settings, self.next_generation);
        self.replace(camera);
        self.key = None;
        info!("camera: switched to generic camera");
    }

    /// Swap in a freshly built camera, carrying over pose and layers.
    fn replace(&mut self, mut camera: ViewerCamera) {
        camera.transform = self.camera.transform;
        camera.set_layers(self.camera.layers().clone());
        camera.update_world_transform();
        self.camera = camera;
        self.next_generation += 1;
    }

    /// Returns false when the pose was left untouched.
    fn update_pose(&mut self, config: &ViewerConfig, snapshot: &AppSnapshot) -> bool {
        let Some(sensor) = snapshot.sensor(config.sensor()) else {
            debug!("camera: sensor {} unknown, pose unchanged", config.sensor().0);
            return false;
        };

        if config.uses_extrinsics() {
            if let Some(extrinsics) = &sensor.extrinsics {
                self.camera.apply_extrinsics(extrinsics);
                return true;
            }
        }

        match config.orbit() {
            Some(orbit) => {
                self.camera.transform = orbit.transform();
                true
            }
            None => false,
        }
    }
}

fn choose(config: &ViewerConfig, snapshot: &AppSnapshot) -> CameraChoice {
    if config.kind() != ViewerKind::ImageWithIntrinsics {
        return CameraChoice::Generic;
    }
    let sensor_id = config.sensor();
    let Some(intrinsics) = snapshot.sensor(sensor_id).and_then(|s| s.intrinsics) else {
        return CameraChoice::Generic;
    };
    let Some(frame) = snapshot.frame(sensor_id) else {
        return CameraChoice::Generic;
    };
    match frame.image_size() {
        Some(image_size) => CameraChoice::Intrinsic(IntrinsicKey { sensor: sensor_id, intrinsics, image_size }),
        None => CameraChoice::Retain,
    }
}
