use std::cell::RefCell;
use std::rc::Rc;

use bevy::prelude::*;

use super::channel::{Channel, SubscriptionId};
use super::snapshot::AppSnapshot;

/// Versioned application state.
///
/// Every mutation produces a new immutable snapshot and synchronously notifies
/// subscribers once, in mutation order. Subscribers read the latest snapshot.
pub struct Store {
    current: RefCell<Rc<AppSnapshot>>,
    changes: Channel<Rc<AppSnapshot>>,
}

impl Store {
    pub fn new(initial: AppSnapshot) -> Self {
        Self {
            current: RefCell::new(Rc::new(initial)),
            changes: Channel::new("store"),
        }
    }

    pub fn snapshot(&self) -> Rc<AppSnapshot> {
        self.current.borrow().clone()
    }

    pub fn version(&self) -> u64 {
        self.current.borrow().version
    }

    /// Apply `mutation` to a copy of the latest snapshot and publish it.
    pub fn dispatch(&self, mutation: impl FnOnce(&mut AppSnapshot)) -> u64 {
        let mut next = (*self.snapshot()).clone();
        mutation(&mut next);
        next.version = self.version() + 1;
        self.publish(next)
    }

    /// Replace the whole snapshot, e.g. with one pushed by the host page.
    /// The version still advances monotonically.
    pub fn replace(&self, mut snapshot: AppSnapshot) -> u64 {
        snapshot.version = snapshot.version.max(self.version() + 1);
        self.publish(snapshot)
    }

    fn publish(&self, snapshot: AppSnapshot) -> u64 {
        let version = snapshot.version;
        let snapshot = Rc::new(snapshot);
        *self.current.borrow_mut() = snapshot.clone();
        debug!("store: published version {}", version);
        self.changes.notify(&snapshot);
        version
    }

    pub fn subscribe(&self, callback: impl FnMut(&Rc<AppSnapshot>) + 'static) -> SubscriptionId {
        self.changes.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.changes.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.changes.subscriber_count()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppSnapshot::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::snapshot::{SensorId, ViewerConfig};

    #[test]
    fn dispatch_advances_version_and_notifies_in_order() {
        let store = Store::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(move |snapshot| sink.borrow_mut().push(snapshot.version));

        store.dispatch(|s| s.session.frozen = true);
        store.dispatch(|s| {
            s.viewers.insert(0, ViewerConfig::PointCloud { sensor: SensorId(0), orbit: None });
        });

        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert!(store.snapshot().session.frozen);
        assert_eq!(store.snapshot().viewers.len(), 1);
    }

    #[test]
    fn old_snapshots_stay_immutable() {
        let store = Store::default();
        let before = store.snapshot();
        store.dispatch(|s| s.session.current_item = 4);

        assert_eq!(before.session.current_item, 0);
        assert_eq!(store.snapshot().session.current_item, 4);
    }

    #[test]
    fn replace_never_moves_version_backwards() {
        let store = Store::default();
        store.dispatch(|_| {});
        store.dispatch(|_| {});

        let version = store.replace(AppSnapshot { version: 1, ..AppSnapshot::default() });
        assert_eq!(version, 3);

        let version = store.replace(AppSnapshot { version: 10, ..AppSnapshot::default() });
        assert_eq!(version, 10);
    }

    #[test]
    fn subscriber_reads_latest_snapshot_from_store() {
        let store = Rc::new(Store::default());
        let weak = Rc::downgrade(&store);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(move |_| {
            if let Some(store) = weak.upgrade() {
                sink.borrow_mut().push(store.snapshot().session.current_item);
            }
        });

        store.dispatch(|s| s.session.current_item = 2);

        assert_eq!(*seen.borrow(), vec![2]);
    }
}
