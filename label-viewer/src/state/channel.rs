use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bevy::prelude::*;

/// Handle returned by [`Channel::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

/// Single-threaded publish/subscribe channel.
///
/// `notify` copies the subscriber list before calling out, so callbacks may
/// subscribe or unsubscribe while a notification is in flight. A callback that
/// is still running when it is notified again is skipped.
pub struct Channel<T> {
    name: &'static str,
    next_id: Cell<u64>,
    subscribers: RefCell<Vec<(SubscriptionId, Callback<T>)>>,
}

impl<T: 'static> Channel<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            next_id: Cell::new(0),
            subscribers: RefCell::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let callback: Callback<T> = Rc::new(RefCell::new(callback));
        self.subscribers.borrow_mut().push((id, callback));
        id
    }

    /// Returns `false` when the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|(sub, _)| *sub != id);
        subscribers.len() != before
    }

    pub fn notify(&self, value: &T) {
        let callbacks: Vec<Callback<T>> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();

        for callback in callbacks {
            match callback.try_borrow_mut() {
                Ok(mut callback) => (&mut *callback)(value),
                Err(_) => warn!("{}: skipped re-entrant notification", self.name),
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_reaches_every_subscriber() {
        let channel = Channel::<u32>::new("test");
        let seen = Rc::new(RefCell::new(Vec::new()));
        for tag in 0..3 {
            let seen = seen.clone();
            channel.subscribe(move |value| seen.borrow_mut().push((tag, *value)));
        }

        channel.notify(&7);

        assert_eq!(*seen.borrow(), vec![(0, 7), (1, 7), (2, 7)]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let channel = Channel::<()>::new("test");
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let id = channel.subscribe(move |_| counter.set(counter.get() + 1));

        channel.notify(&());
        assert!(channel.unsubscribe(id));
        assert!(!channel.unsubscribe(id));
        channel.notify(&());

        assert_eq!(hits.get(), 1);
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn subscriber_may_unsubscribe_itself_during_notify() {
        let channel = Rc::new(Channel::<()>::new("test"));
        let slot: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));
        let hits = Rc::new(Cell::new(0));

        let weak = Rc::downgrade(&channel);
        let own_id = slot.clone();
        let counter = hits.clone();
        let id = channel.subscribe(move |_| {
            counter.set(counter.get() + 1);
            if let (Some(channel), Some(id)) = (weak.upgrade(), own_id.get()) {
                channel.unsubscribe(id);
            }
        });
        slot.set(Some(id));

        channel.notify(&());
        channel.notify(&());

        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn re_entrant_notification_is_skipped() {
        let channel = Rc::new(Channel::<u32>::new("test"));
        let hits = Rc::new(Cell::new(0));

        let weak = Rc::downgrade(&channel);
        let counter = hits.clone();
        channel.subscribe(move |depth| {
            counter.set(counter.get() + 1);
            if *depth == 0 {
                if let Some(channel) = weak.upgrade() {
                    channel.notify(&1);
                }
            }
        });

        channel.notify(&0);

        assert_eq!(hits.get(), 1);
    }
}
