//! Label interaction delegates.
//!
//! A viewer forwards normalized input to one [`label_handler::LabelHandler`]:
//! pointer positions in NDC, the nearest label hit for moves, and key events
//! while it is the active viewer. The delegate answers whether it consumed
//! the event (mouse) or changed the scene (keys).
//!
//! ### Selection (`selection::SelectionHandler`)
//! - Hovering tracks the nearest label under the pointer
//! - Mouse-down on a hovered label selects it and starts a drag
//! - Mouse-up ends the drag
//! - Double-click or `Escape` clears the selection

/// Delegate contract consumed by the viewer.
pub mod label_handler;

/// Hover-and-click label selection.
pub mod selection;
