use std::rc::Rc;

use bevy::prelude::*;
use bevy::render::view::RenderLayers;

use super::layers::assign_layer;
use super::surface::{RenderSurface, SceneRenderer, SizePolicy, apply_size_policy, size_policy};
use crate::engine::camera::provider::CameraProvider;
use crate::engine::camera::viewer_camera::{CameraKind, ViewerCamera};
use crate::engine::core::app_state::{PhaseInputs, ViewerPhase, transition};
use crate::engine::core::context::AppContext;
use crate::engine::raycast::{LabelHit, RaycastParams, cast_from_camera};
use crate::engine::scene::drawable::{Layered, Posed};
use crate::input::coords::device_to_ndc;
use crate::input::keyboard::{KeyEvent, KeyState};
use crate::state::snapshot::{AppSnapshot, LabelId, ViewerId};
use crate::tools::label_handler::LabelHandler;

/// Result of routing one pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventOutcome {
    /// The delegate consumed the event; the host should stop propagation.
    pub consumed: bool,
}

impl EventOutcome {
    pub const IGNORED: Self = Self { consumed: false };
}

/// State of one mounted viewer. Everything here is owned by the viewer;
/// the camera is lent to the delegate and, while active, copied to the registry.
pub(crate) struct ViewerCore {
    id: ViewerId,
    ctx: Rc<AppContext>,
    handler: Box<dyn LabelHandler>,
    camera: CameraProvider,
    phase: ViewerPhase,
    surface: Option<Box<dyn RenderSurface>>,
    renderer: Option<Box<dyn SceneRenderer>>,
    keys: KeyState,
    layer: Option<usize>,
    applied_scale: f32,
}

impl ViewerCore {
    pub(crate) fn new(ctx: Rc<AppContext>, id: ViewerId, handler: Box<dyn LabelHandler>) -> Self {
        let camera = CameraProvider::new(&ctx.settings);
        let applied_scale = ctx.settings.min_scale;
        Self {
            id,
            ctx,
            handler,
            camera,
            phase: ViewerPhase::default(),
            surface: None,
            renderer: None,
            keys: KeyState::default(),
            layer: None,
            applied_scale,
        }
    }

    pub(crate) fn id(&self) -> ViewerId {
        self.id
    }

    pub(crate) fn phase(&self) -> ViewerPhase {
        self.phase
    }

    pub(crate) fn camera(&self) -> &ViewerCamera {
        self.camera.camera()
    }

    pub(crate) fn camera_kind(&self) -> CameraKind {
        self.camera.kind()
    }

    pub(crate) fn layer(&self) -> Option<usize> {
        self.layer
    }

    pub(crate) fn keys(&self) -> &KeyState {
        &self.keys
    }

    pub(crate) fn attach_surface(&mut self, mut surface: Box<dyn RenderSurface>) {
        info!("viewer {}: surface attached", self.id);
        apply_size_policy(surface.as_mut(), SizePolicy::FitContainer);
        self.applied_scale = self.ctx.settings.min_scale;
        self.surface = Some(surface);
        self.renderer = None;
        self.sync();
    }

    pub(crate) fn detach_surface(&mut self) {
        if self.surface.take().is_some() {
            info!("viewer {}: surface detached", self.id);
        }
        self.renderer = None;
        let snapshot = self.ctx.store.snapshot();
        self.refresh_phase(&snapshot);
    }

    /// Release the surface and renderer and withdraw the published camera.
    pub(crate) fn release(&mut self) {
        self.surface = None;
        self.renderer = None;
        self.phase = ViewerPhase::Uninitialized;
        match self.ctx.scene.try_borrow_mut() {
            Ok(mut scene) => scene.clear_active_camera(self.id),
            Err(_) => warn!("viewer {}: scene busy, active camera left published", self.id),
        }
    }

    /// Full reconciliation against the latest snapshot, then redraw.
    pub(crate) fn sync(&mut self) {
        let snapshot = self.ctx.store.snapshot();
        self.refresh_phase(&snapshot);
        self.assign_layers(&snapshot);
        if let Some(config) = snapshot.viewer(self.id) {
            self.camera.reconcile(config, &snapshot, &self.ctx.settings);
        }
        self.redraw(&snapshot);
    }

    /// Scene changed under us: re-check the frame, tag new drawables with
    /// this viewer's layer and redraw.
    pub(crate) fn on_scene_update(&mut self) {
        let snapshot = self.ctx.store.snapshot();
        self.refresh_phase(&snapshot);
        self.assign_layers(&snapshot);
        self.redraw(&snapshot);
    }

    fn ensure_renderer(&mut self) {
        if self.renderer.is_some() {
            return;
        }
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        match surface.create_renderer() {
            Ok(renderer) => {
                info!("viewer {}: renderer created", self.id);
                self.renderer = Some(renderer);
            }
            Err(err) => warn!("viewer {}: {}", self.id, err),
        }
    }

    fn refresh_phase(&mut self, snapshot: &AppSnapshot) {
        self.ensure_renderer();
        let frame_loaded = snapshot
            .viewer(self.id)
            .is_some_and(|config| snapshot.is_frame_loaded(config.sensor()));
        let inputs = PhaseInputs {
            surface_attached: self.surface.is_some(),
            renderer_ready: self.renderer.is_some(),
            frame_loaded,
        };
        transition(&mut self.phase, inputs, self.id);
    }

    fn assign_layers(&mut self, snapshot: &AppSnapshot) {
        let layer = assign_layer(self.id, snapshot.viewer_ids());
        if layer != self.layer {
            debug!("viewer {}: layer {:?} -> {:?}", self.id, self.layer, layer);
        }
        self.layer = layer;

        let Some(layer) = layer else {
            self.camera.camera_mut().set_layers(RenderLayers::none());
            return;
        };
        self.camera.camera_mut().set_layers(RenderLayers::layer(layer));

        let Some(sensor) = snapshot.viewer(self.id).map(|config| config.sensor()) else {
            return;
        };
        // Drawables with no label record yet stay visible everywhere.
        let visible = |label: LabelId| snapshot.labels.get(&label).is_none_or(|record| record.visible_from(sensor));
        match self.ctx.scene.try_borrow_mut() {
            Ok(mut scene) => scene.set_layer_visibility(layer, visible),
            Err(_) => warn!("viewer {}: scene busy, layer visibility unchanged", self.id),
        }
    }

    /// Hand the camera to the delegate and, while active, to the registry.
    fn publish_camera(&mut self, snapshot: &AppSnapshot) {
        self.handler.set_camera(self.camera.camera());

        let Ok(mut scene) = self.ctx.scene.try_borrow_mut() else {
            warn!("viewer {}: scene busy, active camera not published", self.id);
            return;
        };
        if snapshot.session.active_viewer == Some(self.id) {
            scene.set_active_camera(self.id, self.camera.camera());
        } else {
            scene.clear_active_camera(self.id);
        }
    }

    /// Size the canvas and match the camera aspect to it.
    fn fit_surface(&mut self, snapshot: &AppSnapshot) {
        if !self.phase.renders_scene() {
            return;
        }
        let (Some(surface), Some(renderer)) = (self.surface.as_mut(), self.renderer.as_mut()) else {
            return;
        };

        let view_scale = snapshot.viewer(self.id).and_then(|config| config.view_scale());
        let settings = &self.ctx.settings;
        let policy = size_policy(view_scale, self.applied_scale, settings);
        let size = apply_size_policy(surface.as_mut(), policy);
        self.applied_scale = match (policy, view_scale) {
            (SizePolicy::FitContainer, _) | (_, None) => settings.min_scale,
            (_, Some(scale)) => scale,
        };
        renderer.set_size(size);

        let camera = self.camera.camera_mut();
        if size.x > 0 && size.y > 0 {
            camera.set_aspect(size.x as f32 / size.y as f32);
        }
        camera.update_world_transform();
    }

    /// Camera changes land before publishing, so the delegate and the
    /// registry see the camera that renders and picks.
    fn redraw(&mut self, snapshot: &AppSnapshot) {
        self.fit_surface(snapshot);
        self.publish_camera(snapshot);
        self.draw();
    }

    fn draw(&mut self) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        if !self.phase.renders_scene() {
            renderer.clear();
            return;
        }
        let target = match self.ctx.scene.try_borrow() {
            Ok(scene) => scene.render_target(),
            Err(_) => {
                warn!("viewer {}: scene busy, frame skipped", self.id);
                return;
            }
        };
        renderer.render(&target, self.camera.camera());
    }

    fn pointer_ndc(&self, device: Vec2) -> Option<Vec2> {
        let surface = self.surface.as_ref()?;
        match device_to_ndc(device, &surface.bounds()) {
            Ok(ndc) => Some(ndc),
            Err(err) => {
                warn!("viewer {}: {}", self.id, err);
                None
            }
        }
    }

    fn hit_test(&mut self, ndc: Vec2) -> Option<LabelHit> {
        if !self.phase.renders_scene() {
            return None;
        }
        let objects = self.ctx.scene.try_borrow().ok()?.hit_testable_objects();
        let params = RaycastParams::from_settings(&self.ctx.settings);
        cast_from_camera(self.camera.camera_mut(), ndc, &objects, &params)
    }

    fn finish_pointer(&mut self, consumed: bool) -> EventOutcome {
        if consumed {
            let snapshot = self.ctx.store.snapshot();
            self.redraw(&snapshot);
        }
        EventOutcome { consumed }
    }

    pub(crate) fn mouse_down(&mut self, device: Vec2) -> EventOutcome {
        if self.ctx.is_frozen() {
            return EventOutcome::IGNORED;
        }
        let Some(ndc) = self.pointer_ndc(device) else {
            return EventOutcome::IGNORED;
        };
        let consumed = self.handler.on_mouse_down(ndc);
        self.finish_pointer(consumed)
    }

    pub(crate) fn mouse_up(&mut self) -> EventOutcome {
        if self.ctx.is_frozen() || self.surface.is_none() {
            return EventOutcome::IGNORED;
        }
        let consumed = self.handler.on_mouse_up();
        self.finish_pointer(consumed)
    }

    pub(crate) fn mouse_move(&mut self, device: Vec2) -> EventOutcome {
        if self.ctx.is_frozen() {
            return EventOutcome::IGNORED;
        }
        let Some(ndc) = self.pointer_ndc(device) else {
            return EventOutcome::IGNORED;
        };
        let hit = self.hit_test(ndc);
        let consumed = self.handler.on_mouse_move(ndc, hit.as_ref());
        self.finish_pointer(consumed)
    }

    pub(crate) fn double_click(&mut self) -> EventOutcome {
        if self.ctx.is_frozen() || self.surface.is_none() {
            return EventOutcome::IGNORED;
        }
        let consumed = self.handler.on_double_click();
        self.finish_pointer(consumed)
    }

    fn accepts_keys(&self) -> bool {
        !self.ctx.is_frozen() && self.ctx.active_viewer() == Some(self.id)
    }

    /// Returns whether the delegate changed the scene.
    pub(crate) fn key_down(&mut self, event: &KeyEvent) -> bool {
        if !self.accepts_keys() {
            return false;
        }
        self.keys.press(&event.key);
        self.handler.on_key_down(event)
    }

    /// Key-up always clears the key, even when the event is otherwise ignored.
    pub(crate) fn key_up(&mut self, event: &KeyEvent) -> bool {
        self.keys.release(&event.key);
        if !self.accepts_keys() {
            return false;
        }
        self.handler.on_key_up(event)
    }
}
