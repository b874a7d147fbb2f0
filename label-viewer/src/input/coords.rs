use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewerError};

/// On-screen rectangle of a canvas in device (client) pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl CanvasRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Device pixel position relative to the canvas's top-left corner.
///
/// `bounds` must be read fresh for every event; the canvas moves with layout and scroll.
pub fn to_canvas_local(device: Vec2, bounds: &CanvasRect) -> Vec2 {
    device - Vec2::new(bounds.left, bounds.top)
}

/// Map `[0, width] x [0, height]` onto `[-1, 1] x [1, -1]` (Y up).
pub fn to_ndc(local: Vec2, width: f32, height: f32) -> Result<Vec2> {
    if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
        return Err(ViewerError::DegenerateCanvas { width, height });
    }
    Ok(Vec2::new(
        local.x / width * 2.0 - 1.0,
        -(local.y / height) * 2.0 + 1.0,
    ))
}

pub fn device_to_ndc(device: Vec2, bounds: &CanvasRect) -> Result<Vec2> {
    to_ndc(to_canvas_local(device, bounds), bounds.width, bounds.height)
}
