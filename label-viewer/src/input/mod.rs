//! Input normalisation: device pixels to canvas-local pixels to NDC, and
//! document-level keyboard events.

/// Device → canvas-local → normalised device coordinate transforms.
pub mod coords;

/// Key events, held-key tracking, and the document keyboard source.
pub mod keyboard;
