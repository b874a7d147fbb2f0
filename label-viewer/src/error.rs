//! Error types for the label viewer.
//!
//! None of these reach the host UI from the synchronization core: the core logs
//! them and degrades. They surface from fallible constructors and the host bridge.

use thiserror::Error;

use crate::state::snapshot::ViewerId;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("canvas has degenerate size {width}x{height}")]
    DegenerateCanvas { width: f32, height: f32 },

    #[error("renderer unavailable: {0}")]
    RendererUnavailable(String),

    #[error("invalid json: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("unknown viewer {0}")]
    UnknownViewer(ViewerId),

    #[error("surface error: {0}")]
    Surface(String),
}

pub type Result<T> = std::result::Result<T, ViewerError>;
