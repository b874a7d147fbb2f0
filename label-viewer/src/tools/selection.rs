use bevy::prelude::*;

use super::label_handler::LabelHandler;
use crate::engine::camera::viewer_camera::ViewerCamera;
use crate::engine::raycast::LabelHit;
use crate::input::keyboard::KeyEvent;
use crate::state::snapshot::LabelId;

/// Hover-and-click label selection.
#[derive(Debug, Default)]
pub struct SelectionHandler {
    hovered: Option<LabelId>,
    selected: Option<LabelId>,
    dragging: bool,
    pointer: Vec2,
    camera_generation: Option<u64>,
}

impl SelectionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<LabelId> {
        self.hovered
    }

    pub fn selected(&self) -> Option<LabelId> {
        self.selected
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Last pointer position in NDC.
    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Generation of the camera last received from the viewer.
    pub fn camera_generation(&self) -> Option<u64> {
        self.camera_generation
    }

    fn clear_selection(&mut self) -> bool {
        self.dragging = false;
        match self.selected.take() {
            Some(label) => {
                info!("Selection cleared: label {}", label);
                true
            }
            None => false, // Nothing selected.
        }
    }
}

impl LabelHandler for SelectionHandler {
    fn set_camera(&mut self, camera: &ViewerCamera) {
        self.camera_generation = Some(camera.generation());
    }

    fn on_mouse_down(&mut self, ndc: Vec2) -> bool {
        self.pointer = ndc;
        let Some(label) = self.hovered else {
            return false;
        };
        if self.selected != Some(label) {
            info!("Selection: label {}", label);
        }
        self.selected = Some(label);
        self.dragging = true;
        true
    }

    fn on_mouse_up(&mut self) -> bool {
        std::mem::take(&mut self.dragging)
    }

    fn on_mouse_move(&mut self, ndc: Vec2, hit: Option<&LabelHit>) -> bool {
        self.pointer = ndc;
        let hovered = hit.map(|hit| hit.label);
        let hover_changed = hovered != self.hovered;
        self.hovered = hovered;
        self.dragging || hover_changed
    }

    fn on_double_click(&mut self) -> bool {
        self.clear_selection()
    }

    fn on_key_down(&mut self, event: &KeyEvent) -> bool {
        match event.key.as_str() {
            "Escape" => self.clear_selection(),
            _ => false,
        }
    }

    fn on_key_up(&mut self, _event: &KeyEvent) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(label: LabelId) -> LabelHit {
        LabelHit { label, distance: 3.0, point: Vec3::ZERO }
    }

    #[test]
    fn click_on_hovered_label_selects_it() {
        let mut handler = SelectionHandler::new();

        assert!(handler.on_mouse_move(Vec2::ZERO, Some(&hit(5))));
        assert!(handler.on_mouse_down(Vec2::ZERO));
        assert_eq!(handler.selected(), Some(5));
        assert!(handler.is_dragging());
        assert!(handler.on_mouse_up());
        assert!(!handler.on_mouse_up());
    }

    #[test]
    fn click_on_empty_space_is_not_consumed() {
        let mut handler = SelectionHandler::new();
        handler.on_mouse_move(Vec2::new(0.5, 0.5), None);

        assert!(!handler.on_mouse_down(Vec2::new(0.5, 0.5)));
        assert_eq!(handler.selected(), None);
        assert_eq!(handler.pointer(), Vec2::new(0.5, 0.5));
    }

    #[test]
    fn steady_hover_is_not_consumed() {
        let mut handler = SelectionHandler::new();
        handler.on_mouse_move(Vec2::ZERO, Some(&hit(1)));

        assert!(!handler.on_mouse_move(Vec2::new(0.1, 0.0), Some(&hit(1))));
    }

    #[test]
    fn escape_and_double_click_clear_selection() {
        let mut handler = SelectionHandler::new();
        handler.on_mouse_move(Vec2::ZERO, Some(&hit(2)));
        handler.on_mouse_down(Vec2::ZERO);

        assert!(!handler.on_key_down(&KeyEvent::new("a")));
        assert!(handler.on_key_down(&KeyEvent::new("Escape")));
        assert!(!handler.on_key_down(&KeyEvent::new("Escape")));

        handler.on_mouse_down(Vec2::ZERO);
        assert!(handler.on_double_click());
        assert_eq!(handler.selected(), None);
    }

    #[test]
    fn remembers_camera_generation() {
        let mut handler = SelectionHandler::new();
        let camera = ViewerCamera::generic(&crate::state::settings::ViewerSettings::default(), 7);

        handler.set_camera(&camera);

        assert_eq!(handler.camera_generation(), Some(7));
    }
}
