use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::state::channel::{Channel, SubscriptionId};

/// A keyboard event as reported by the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Key name as the browser reports it (`"Escape"`, `"a"`, `"Shift"`).
    pub key: String,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), ..Self::default() }
    }
}

/// Which keys are currently held. Entries clear only on key-up.
#[derive(Debug, Default)]
pub struct KeyState {
    down: HashMap<String, bool>,
}

impl KeyState {
    pub fn press(&mut self, key: &str) {
        self.down.insert(key.to_string(), true);
    }

    pub fn release(&mut self, key: &str) {
        self.down.remove(key);
    }

    pub fn is_down(&self, key: &str) -> bool {
        self.down.get(key).copied().unwrap_or(false)
    }

    pub fn held(&self) -> usize {
        self.down.values().filter(|down| **down).count()
    }
}

/// Subscription ids of one key-down / key-up listener pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyListeners {
    pub down: SubscriptionId,
    pub up: SubscriptionId,
}

/// Document-level keyboard event source.
///
/// Listeners here receive keys regardless of which element has focus.
pub struct KeyboardSource {
    key_down: Channel<KeyEvent>,
    key_up: Channel<KeyEvent>,
}

impl Default for KeyboardSource {
    fn default() -> Self {
        Self {
            key_down: Channel::new("keydown"),
            key_up: Channel::new("keyup"),
        }
    }
}

impl KeyboardSource {
    pub fn listen(
        &self,
        on_down: impl FnMut(&KeyEvent) + 'static,
        on_up: impl FnMut(&KeyEvent) + 'static,
    ) -> KeyListeners {
        KeyListeners {
            down: self.key_down.subscribe(on_down),
            up: self.key_up.subscribe(on_up),
        }
    }

    pub fn unlisten(&self, listeners: KeyListeners) {
        self.key_down.unsubscribe(listeners.down);
        self.key_up.unsubscribe(listeners.up);
    }

    pub fn key_down(&self, event: &KeyEvent) {
        self.key_down.notify(event);
    }

    pub fn key_up(&self, event: &KeyEvent) {
        self.key_up.notify(event);
    }

    /// Registered (key-down, key-up) listener counts.
    pub fn listener_counts(&self) -> (usize, usize) {
        (self.key_down.subscriber_count(), self.key_up.subscriber_count())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn key_up_clears_key() {
        let mut keys = KeyState::default();
        keys.press("Shift");
        keys.press("a");
        assert!(keys.is_down("Shift"));
        assert_eq!(keys.held(), 2);

        keys.release("Shift");

        assert!(!keys.is_down("Shift"));
        assert!(keys.is_down("a"));
        assert_eq!(keys.held(), 1);
    }

    #[test]
    fn listen_and_unlisten_are_paired() {
        let source = KeyboardSource::default();
        let log = Rc::new(RefCell::new(Vec::new()));
        let (down_log, up_log) = (log.clone(), log.clone());
        let listeners = source.listen(
            move |e| down_log.borrow_mut().push(format!("down:{}", e.key)),
            move |e| up_log.borrow_mut().push(format!("up:{}", e.key)),
        );
        assert_eq!(source.listener_counts(), (1, 1));

        source.key_down(&KeyEvent::new("x"));
        source.key_up(&KeyEvent::new("x"));
        source.unlisten(listeners);
        source.key_down(&KeyEvent::new("y"));

        assert_eq!(*log.borrow(), vec!["down:x".to_string(), "up:x".to_string()]);
        assert_eq!(source.listener_counts(), (0, 0));
    }
}
