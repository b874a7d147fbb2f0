use bevy::prelude::*;

use crate::engine::camera::viewer_camera::ViewerCamera;
use crate::engine::raycast::LabelHit;
use crate::input::keyboard::KeyEvent;

/// Consumer of normalized viewer input that drives label editing gestures.
///
/// Mouse methods return whether the event was consumed; key methods return
/// whether the scene changed. The viewer acts on these flags and never asks why.
pub trait LabelHandler {
    /// Camera the viewer renders through, re-sent after every reconciliation.
    fn set_camera(&mut self, camera: &ViewerCamera);
    fn on_mouse_down(&mut self, ndc: Vec2) -> bool;
    fn on_mouse_up(&mut self) -> bool;
    /// `hit` is the nearest label under the pointer, if any.
    fn on_mouse_move(&mut self, ndc: Vec2, hit: Option<&LabelHit>) -> bool;
    fn on_double_click(&mut self) -> bool;
    fn on_key_down(&mut self, event: &KeyEvent) -> bool;
    fn on_key_up(&mut self, event: &KeyEvent) -> bool;
}
