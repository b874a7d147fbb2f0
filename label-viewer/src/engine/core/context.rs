use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::scene::registry::SceneRegistry;
use crate::input::keyboard::KeyboardSource;
use crate::state::channel::Channel;
use crate::state::settings::ViewerSettings;
use crate::state::snapshot::{AppSnapshot, ViewerId};
use crate::state::store::Store;

/// Everything viewers share, built once by the host and handed to each
/// viewer at mount.
pub struct AppContext {
    pub store: Store,
    pub scene: RefCell<SceneRegistry>,
    /// "Re-render now" notifications from whoever mutates the scene.
    pub scene_updates: Channel<()>,
    pub keyboard: KeyboardSource,
    pub settings: ViewerSettings,
}

impl AppContext {
    pub fn new(initial: AppSnapshot, settings: ViewerSettings) -> Rc<Self> {
        Rc::new(Self {
            store: Store::new(initial),
            scene: RefCell::new(SceneRegistry::new()),
            scene_updates: Channel::new("scene_updates"),
            keyboard: KeyboardSource::default(),
            settings,
        })
    }

    pub fn active_viewer(&self) -> Option<ViewerId> {
        self.store.snapshot().session.active_viewer
    }

    /// Input is ignored while the session is frozen or read-only.
    pub fn is_frozen(&self) -> bool {
        self.store.snapshot().session.should_freeze()
    }

    pub fn notify_scene_updated(&self) {
        self.scene_updates.notify(&());
    }
}
