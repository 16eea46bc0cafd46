//! Render job messages

use std::time::Duration;

use crate::geometry::{IRect, Matrix};

/// Parameters for rendering one tile
#[derive(Clone, Copy, Debug)]
pub(crate) struct RenderJob {
    /// Target box out of the full rendered page, in device pixels
    pub viewport: IRect,
    /// Page-space to device-pixel transform
    pub transform: Matrix,
    /// Interruptible wait before the render starts
    pub delay: Duration,
}

/// Message sent to the render worker
#[derive(Debug)]
pub(crate) enum JobMsg {
    Render(RenderJob),
    Shutdown,
}
