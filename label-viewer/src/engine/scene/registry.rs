use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use bevy::prelude::*;
use bevy::render::view::RenderLayers;

use super::drawable::Drawable;
use crate::engine::camera::viewer_camera::ViewerCamera;
use crate::state::snapshot::{LabelId, ViewerId};

pub type SharedDrawable = Rc<RefCell<dyn Drawable>>;

/// One drawable as the renderer sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem {
    pub label: LabelId,
    pub world: GlobalTransform,
    pub layers: RenderLayers,
}

/// Render-ready copy of the scene taken at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderTarget {
    pub items: Vec<RenderItem>,
}

impl RenderTarget {
    /// Items sharing a layer with `layers`.
    pub fn visible_to<'a>(&'a self, layers: &'a RenderLayers) -> impl Iterator<Item = &'a RenderItem> + 'a {
        self.items.iter().filter(move |item| item.layers.intersects(layers))
    }
}

/// Camera published by the globally active viewer.
#[derive(Debug, Clone)]
pub struct ActiveCamera {
    pub owner: ViewerId,
    pub camera: ViewerCamera,
}

/// Label drawables shared by every viewer, iterated in ascending label id.
#[derive(Default)]
pub struct SceneRegistry {
    drawables: BTreeMap<LabelId, SharedDrawable>,
    active_camera: Option<ActiveCamera>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a drawable under its label id, returning any it replaces.
    pub fn insert(&mut self, drawable: SharedDrawable) -> Option<SharedDrawable> {
        let label = drawable.borrow().label_id();
        debug!("scene: insert label {}", label);
        self.drawables.insert(label, drawable)
    }

    pub fn remove(&mut self, label: LabelId) -> Option<SharedDrawable> {
        debug!("scene: remove label {}", label);
        self.drawables.remove(&label)
    }

    pub fn lookup_label(&self, label: LabelId) -> Option<SharedDrawable> {
        self.drawables.get(&label).cloned()
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }

    /// Handles to everything pickable right now. Later inserts and removals do
    /// not affect a list already handed out.
    pub fn hit_testable_objects(&self) -> Vec<SharedDrawable> {
        self.drawables.values().cloned().collect()
    }

    pub fn render_target(&self) -> RenderTarget {
        let items = self
            .drawables
            .iter()
            .filter_map(|(label, drawable)| {
                let mut drawable = drawable.try_borrow_mut().ok()?;
                drawable.update_world_transform();
                Some(RenderItem {
                    label: *label,
                    world: drawable.world_transform(),
                    layers: drawable.layers().clone(),
                })
            })
            .collect();
        RenderTarget { items }
    }

    /// Add `layer` to drawables whose label passes `visible`, remove it from the rest.
    pub fn set_layer_visibility(&mut self, layer: usize, visible: impl Fn(LabelId) -> bool) {
        for (label, drawable) in &self.drawables {
            let Ok(mut drawable) = drawable.try_borrow_mut() else {
                warn!("scene: label {} busy, layer {} unchanged", label, layer);
                continue;
            };
            let current = drawable.layers().clone();
            let next = if visible(*label) { current.with(layer) } else { current.without(layer) };
            drawable.set_layers(next);
        }
    }

    pub fn set_active_camera(&mut self, owner: ViewerId, camera: &ViewerCamera) {
        self.active_camera = Some(ActiveCamera { owner, camera: camera.clone() });
    }

    /// Drop the published camera if `owner` published it.
    pub fn clear_active_camera(&mut self, owner: ViewerId) {
        if self.active_camera.as_ref().is_some_and(|active| active.owner == owner) {
            self.active_camera = None;
        }
    }

    pub fn active_camera(&self) -> Option<&ActiveCamera> {
        self.active_camera.as_ref()
    }
}
