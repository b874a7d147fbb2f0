use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use bevy::prelude::*;

use super::surface::RenderSurface;
use super::sync::{EventOutcome, ViewerCore};
use crate::engine::camera::viewer_camera::{CameraKind, ViewerCamera};
use crate::engine::core::app_state::ViewerPhase;
use crate::engine::core::context::AppContext;
use crate::input::keyboard::KeyListeners;
use crate::state::channel::SubscriptionId;
use crate::state::snapshot::ViewerId;
use crate::tools::label_handler::LabelHandler;

/// A mounted viewer.
///
/// Mounting subscribes to store changes, scene updates and document key
/// events. Dropping the handle unsubscribes all of them and releases the
/// surface and renderer.
///
/// Notifications that arrive while the viewer is handling an event (the
/// delegate dispatching a store mutation, say) are deferred and replayed as
/// a full sync once the event returns.
pub struct Viewer {
    core: Rc<RefCell<ViewerCore>>,
    resync: Rc<Cell<bool>>,
    ctx: Rc<AppContext>,
    store_subscription: SubscriptionId,
    scene_subscription: SubscriptionId,
    key_listeners: KeyListeners,
}

impl Viewer {
    pub fn mount(ctx: &Rc<AppContext>, id: ViewerId, handler: Box<dyn LabelHandler>) -> Self {
        let core = Rc::new(RefCell::new(ViewerCore::new(ctx.clone(), id, handler)));
        let resync = Rc::new(Cell::new(false));

        let (weak, pending) = (Rc::downgrade(&core), resync.clone());
        let store_subscription = ctx.store.subscribe(move |_| {
            with_core(&weak, &pending, "state change", ViewerCore::sync);
        });

        let (weak, pending) = (Rc::downgrade(&core), resync.clone());
        let scene_subscription = ctx.scene_updates.subscribe(move |_| {
            with_core(&weak, &pending, "scene update", ViewerCore::on_scene_update);
        });

        let (down_core, up_core) = (Rc::downgrade(&core), Rc::downgrade(&core));
        let (down_pending, up_pending) = (resync.clone(), resync.clone());
        let (down_ctx, up_ctx) = (Rc::downgrade(ctx), Rc::downgrade(ctx));
        let key_listeners = ctx.keyboard.listen(
            move |event| route_key(&down_core, &down_pending, &down_ctx, |core| core.key_down(event)),
            move |event| route_key(&up_core, &up_pending, &up_ctx, |core| core.key_up(event)),
        );

        info!("viewer {}: mounted", id);
        core.borrow_mut().sync();

        Self {
            core,
            resync,
            ctx: ctx.clone(),
            store_subscription,
            scene_subscription,
            key_listeners,
        }
    }

    pub fn id(&self) -> ViewerId {
        self.core.borrow().id()
    }

    pub fn attach_surface(&self, surface: Box<dyn RenderSurface>) {
        self.core.borrow_mut().attach_surface(surface);
        resync_deferred(&self.core, &self.resync);
    }

    pub fn detach_surface(&self) {
        self.core.borrow_mut().detach_surface();
        resync_deferred(&self.core, &self.resync);
    }

    pub fn mouse_down(&self, device: Vec2) -> EventOutcome {
        let outcome = self.core.borrow_mut().mouse_down(device);
        resync_deferred(&self.core, &self.resync);
        outcome
    }

    pub fn mouse_up(&self) -> EventOutcome {
        let outcome = self.core.borrow_mut().mouse_up();
        resync_deferred(&self.core, &self.resync);
        outcome
    }

    pub fn mouse_move(&self, device: Vec2) -> EventOutcome {
        let outcome = self.core.borrow_mut().mouse_move(device);
        resync_deferred(&self.core, &self.resync);
        outcome
    }

    pub fn double_click(&self) -> EventOutcome {
        let outcome = self.core.borrow_mut().double_click();
        resync_deferred(&self.core, &self.resync);
        outcome
    }

    pub fn phase(&self) -> ViewerPhase {
        self.core.borrow().phase()
    }

    pub fn camera_kind(&self) -> CameraKind {
        self.core.borrow().camera_kind()
    }

    /// Copy of the current camera.
    pub fn camera(&self) -> ViewerCamera {
        self.core.borrow().camera().clone()
    }

    pub fn layer(&self) -> Option<usize> {
        self.core.borrow().layer()
    }

    pub fn is_key_down(&self, key: &str) -> bool {
        self.core.borrow().keys().is_down(key)
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.ctx.store.unsubscribe(self.store_subscription);
        self.ctx.scene_updates.unsubscribe(self.scene_subscription);
        self.ctx.keyboard.unlisten(self.key_listeners);
        match self.core.try_borrow_mut() {
            Ok(mut core) => {
                core.release();
                info!("viewer {}: unmounted", core.id());
            }
            Err(_) => warn!("viewer: unmounted while busy, resources freed with the handle"),
        }
    }
}

fn with_core(
    core: &Weak<RefCell<ViewerCore>>,
    resync: &Cell<bool>,
    source: &str,
    f: impl FnOnce(&mut ViewerCore),
) {
    let Some(core) = core.upgrade() else {
        return;
    };
    match core.try_borrow_mut() {
        Ok(mut core) => f(&mut core),
        Err(_) => {
            debug!("viewer: {} arrived while busy, deferred", source);
            resync.set(true);
        }
    }
}

/// Replay notifications deferred while the core was borrowed.
fn resync_deferred(core: &Rc<RefCell<ViewerCore>>, resync: &Cell<bool>) {
    if !resync.replace(false) {
        return;
    }
    match core.try_borrow_mut() {
        Ok(mut core) => core.sync(),
        Err(_) => resync.set(true),
    }
}

/// Route a key event and announce a scene change after the core is released,
/// so this viewer's own scene-update subscription can redraw.
fn route_key(
    core: &Weak<RefCell<ViewerCore>>,
    resync: &Cell<bool>,
    ctx: &Weak<AppContext>,
    f: impl FnOnce(&mut ViewerCore) -> bool,
) {
    let mut changed = false;
    with_core(core, resync, "key event", |core| changed = f(core));
    if let Some(strong) = core.upgrade() {
        resync_deferred(&strong, resync);
    }
    if changed {
        if let Some(ctx) = ctx.upgrade() {
            ctx.notify_scene_updated();
        }
    }
}
