//! Browser bindings for wasm32 builds.

use std::rc::Rc;

use bevy::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, KeyboardEvent, MouseEvent};

use super::handle::Viewer;
use super::surface::{RenderSurface, SceneRenderer};
use crate::engine::camera::viewer_camera::ViewerCamera;
use crate::engine::core::context::AppContext;
use crate::engine::scene::drawable::Layered;
use crate::engine::scene::registry::RenderTarget;
use crate::error::{Result, ViewerError};
use crate::input::coords::CanvasRect;
use crate::input::keyboard::KeyEvent;

fn rect_of(element: &web_sys::Element) -> CanvasRect {
    let rect = element.get_bounding_client_rect();
    CanvasRect::new(rect.left() as f32, rect.top() as f32, rect.width() as f32, rect.height() as f32)
}

/// Canvas element a viewer draws into.
pub struct HtmlCanvasSurface {
    canvas: HtmlCanvasElement,
}

impl HtmlCanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas }
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl RenderSurface for HtmlCanvasSurface {
    fn bounds(&self) -> CanvasRect {
        rect_of(&self.canvas)
    }

    fn container_bounds(&self) -> Option<CanvasRect> {
        self.canvas.parent_element().map(|parent| rect_of(&parent))
    }

    fn set_size(&mut self, width: f32, height: f32) {
        let style = self.canvas.style();
        for (name, value) in [("width", width), ("height", height)] {
            if let Err(e) = style.set_property(name, &format!("{}px", value)) {
                warn!("canvas: failed to set {}: {:?}", name, e);
            }
        }
        self.canvas.set_width(width.max(0.0) as u32);
        self.canvas.set_height(height.max(0.0) as u32);
    }

    fn clear_inline_size(&mut self) {
        let style = self.canvas.style();
        for name in ["width", "height"] {
            if let Err(e) = style.remove_property(name) {
                warn!("canvas: failed to clear {}: {:?}", name, e);
            }
        }
    }

    fn create_renderer(&mut self) -> Result<Box<dyn SceneRenderer>> {
        let context = self
            .canvas
            .get_context("2d")
            .map_err(|e| ViewerError::RendererUnavailable(format!("{:?}", e)))?
            .ok_or_else(|| ViewerError::RendererUnavailable("2d context unsupported".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| ViewerError::RendererUnavailable("unexpected context type".into()))?;
        Ok(Box::new(CanvasRenderer { context, size: UVec2::ZERO }))
    }
}

/// Draws each visible label as a marker at its projected origin.
struct CanvasRenderer {
    context: CanvasRenderingContext2d,
    size: UVec2,
}

impl SceneRenderer for CanvasRenderer {
    fn set_size(&mut self, size: UVec2) {
        self.size = size;
    }

    fn clear(&mut self) {
        self.context.clear_rect(0.0, 0.0, self.size.x as f64, self.size.y as f64);
    }

    fn render(&mut self, target: &RenderTarget, camera: &ViewerCamera) {
        self.clear();
        let view_projection = camera.view_projection();
        let size = self.size.as_vec2();
        self.context.set_fill_style_str("#ffcc00");
        for item in target.visible_to(camera.layers()) {
            let clip = view_projection * item.world.translation().extend(1.0);
            if clip.w <= 0.0 {
                continue;
            }
            let ndc = clip.truncate() / clip.w;
            if ndc.z.abs() > 1.0 {
                continue;
            }
            let x = (ndc.x + 1.0) * 0.5 * size.x;
            let y = (1.0 - ndc.y) * 0.5 * size.y;
            self.context.fill_rect(x as f64 - 3.0, y as f64 - 3.0, 6.0, 6.0);
        }
    }
}

/// Document-level key listeners feeding the context's keyboard source.
pub struct DocumentKeyboard {
    document: Document,
    on_down: Closure<dyn FnMut(KeyboardEvent)>,
    on_up: Closure<dyn FnMut(KeyboardEvent)>,
}

fn key_event(event: &KeyboardEvent) -> KeyEvent {
    KeyEvent {
        key: event.key(),
        shift: event.shift_key(),
        ctrl: event.ctrl_key(),
        alt: event.alt_key(),
        meta: event.meta_key(),
    }
}

impl DocumentKeyboard {
    pub fn install(ctx: &Rc<AppContext>) -> Result<Self> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| ViewerError::Surface("document unavailable".into()))?;

        let down_ctx = Rc::downgrade(ctx);
        let on_down = Closure::wrap(Box::new(move |event: KeyboardEvent| {
            if let Some(ctx) = down_ctx.upgrade() {
                ctx.keyboard.key_down(&key_event(&event));
            }
        }) as Box<dyn FnMut(KeyboardEvent)>);

        let up_ctx = Rc::downgrade(ctx);
        let on_up = Closure::wrap(Box::new(move |event: KeyboardEvent| {
            if let Some(ctx) = up_ctx.upgrade() {
                ctx.keyboard.key_up(&key_event(&event));
            }
        }) as Box<dyn FnMut(KeyboardEvent)>);

        document
            .add_event_listener_with_callback("keydown", on_down.as_ref().unchecked_ref())
            .map_err(|e| ViewerError::Surface(format!("keydown listener: {:?}", e)))?;
        document
            .add_event_listener_with_callback("keyup", on_up.as_ref().unchecked_ref())
            .map_err(|e| ViewerError::Surface(format!("keyup listener: {:?}", e)))?;
        info!("keyboard: document listeners installed");

        Ok(Self { document, on_down, on_up })
    }
}

impl Drop for DocumentKeyboard {
    fn drop(&mut self) {
        let _ = self
            .document
            .remove_event_listener_with_callback("keydown", self.on_down.as_ref().unchecked_ref());
        let _ = self
            .document
            .remove_event_listener_with_callback("keyup", self.on_up.as_ref().unchecked_ref());
        info!("keyboard: document listeners removed");
    }
}

/// Mouse listeners on a canvas, routing into a viewer. Consumed events stop
/// propagating. Removed on drop.
pub struct CanvasPointerBindings {
    canvas: HtmlCanvasElement,
    listeners: Vec<(&'static str, Closure<dyn FnMut(MouseEvent)>)>,
}

impl CanvasPointerBindings {
    pub fn bind(canvas: &HtmlCanvasElement, viewer: &Rc<Viewer>) -> Result<Self> {
        let mut listeners = Vec::new();
        for name in ["mousedown", "mouseup", "mousemove", "dblclick"] {
            let weak = Rc::downgrade(viewer);
            let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
                let Some(viewer) = weak.upgrade() else {
                    return;
                };
                let device = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                let outcome = match name {
                    "mousedown" => viewer.mouse_down(device),
                    "mouseup" => viewer.mouse_up(),
                    "mousemove" => viewer.mouse_move(device),
                    _ => viewer.double_click(),
                };
                if outcome.consumed {
                    event.stop_propagation();
                }
            }) as Box<dyn FnMut(MouseEvent)>);
            canvas
                .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
                .map_err(|e| ViewerError::Surface(format!("{} listener: {:?}", name, e)))?;
            listeners.push((name, closure));
        }
        Ok(Self { canvas: canvas.clone(), listeners })
    }
}

impl Drop for CanvasPointerBindings {
    fn drop(&mut self) {
        for (name, closure) in &self.listeners {
            let _ = self
                .canvas
                .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        }
    }
}
