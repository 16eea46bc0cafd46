//! Contracts for the external document engine

use crate::geometry::{IRect, Matrix, Rect};
use crate::tile::TilePixmap;

/// Errors from the document engine
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[cfg(feature = "pdf")]
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),

    #[error("{detail}")]
    Generic { detail: String },
}

impl RenderError {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// An open document from which pages can be decoded.
///
/// Implementations are shared with the view coordinator thread behind an
/// `Arc`, so opening a page must be callable from there.
pub trait Document: Send + Sync + 'static {
    type Page: PageHandle;

    /// Decode page `index` (0-based). Rendering latency is unpredictable;
    /// the handle is moved onto a dedicated render worker thread.
    fn open_page(&self, index: usize) -> Result<Self::Page, RenderError>;
}

/// A single decoded page.
///
/// The handle is owned by exactly one render worker at a time and is
/// released by dropping it. `bounds` uses the document's native page units
/// with a bottom-left origin; any rotation the backend has already folded
/// into `bounds` must not be reported again by `rotation`.
pub trait PageHandle: Send + 'static {
    /// Media bounding box in page units
    fn bounds(&self) -> Rect;

    /// Intrinsic page rotation in degrees (0/90/180/270)
    fn rotation(&self) -> i32;

    /// Rasterize `viewport` (a box in full-page pixel coordinates) using
    /// the page-to-device `transform`. Blocks for the duration of the
    /// render; the worker owns the handle exclusively while this runs.
    fn render(&mut self, viewport: IRect, transform: Matrix) -> Result<TilePixmap, RenderError>;
}
