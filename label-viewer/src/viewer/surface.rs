use bevy::prelude::*;

use crate::engine::camera::viewer_camera::ViewerCamera;
use crate::engine::scene::registry::RenderTarget;
use crate::error::Result;
use crate::input::coords::CanvasRect;
use crate::state::settings::ViewerSettings;

/// Draws a scene snapshot through a camera.
pub trait SceneRenderer {
    fn set_size(&mut self, size: UVec2);
    /// Clear the framebuffer without drawing the scene.
    fn clear(&mut self);
    fn render(&mut self, target: &RenderTarget, camera: &ViewerCamera);
}

/// The drawing surface a viewer is attached to.
pub trait RenderSurface {
    /// Current on-screen rectangle. Read on every call, the surface may move.
    fn bounds(&self) -> CanvasRect;
    /// Rectangle of the element the surface is laid out in.
    fn container_bounds(&self) -> Option<CanvasRect>;
    fn set_size(&mut self, width: f32, height: f32);
    /// Drop any inline sizing so the container bounds reflect layout alone.
    fn clear_inline_size(&mut self);
    fn create_renderer(&mut self) -> Result<Box<dyn SceneRenderer>>;
}

/// How the surface should be sized on the next redraw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizePolicy {
    /// Match the container exactly.
    FitContainer,
    /// Scale the current size by `ratio` of new to previously applied view scale.
    Scale { ratio: f32 },
    Keep,
}

/// Decide the sizing step for a viewer showing `view_scale` (image viewers only)
/// given the scale last applied to its surface.
pub fn size_policy(view_scale: Option<f32>, applied_scale: f32, settings: &ViewerSettings) -> SizePolicy {
    match view_scale {
        Some(scale) if settings.scale_in_range(scale) => {
            if (scale - applied_scale).abs() <= f32::EPSILON {
                SizePolicy::Keep
            } else {
                SizePolicy::Scale { ratio: scale / applied_scale }
            }
        }
        _ => SizePolicy::FitContainer,
    }
}

/// Apply `policy` to `surface` and return its resulting pixel size.
pub fn apply_size_policy(surface: &mut dyn RenderSurface, policy: SizePolicy) -> UVec2 {
    match policy {
        SizePolicy::FitContainer => {
            surface.clear_inline_size();
            if let Some(container) = surface.container_bounds() {
                surface.set_size(container.width, container.height);
            }
        }
        SizePolicy::Scale { ratio } => {
            let size = surface.bounds().size() * ratio;
            surface.set_size(size.x, size.y);
        }
        SizePolicy::Keep => {}
    }
    surface.bounds().size().max(Vec2::ZERO).round().as_uvec2()
}
