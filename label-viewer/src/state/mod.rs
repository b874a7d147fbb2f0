//! Application state consumed by the viewers.
//!
//! The host owns the state tree; viewers read immutable snapshots from the
//! [`store::Store`] and are told about changes through its subscription list.
//! Scene-level change notices travel on a separate [`channel::Channel`].

/// Single-threaded publish/subscribe channel used for every notification source.
pub mod channel;

/// Viewer tunables with JSON loading.
pub mod settings;

/// Snapshot schema: viewer configs, sensors, labels, loaded frames, session flags.
pub mod snapshot;

/// Versioned snapshot store with synchronous change notification.
pub mod store;
