//! Presentation surface contract

use crate::tile::TilePixmap;

/// What the view coordinator wants on screen for one redraw
#[derive(Debug)]
pub enum Frame<'a> {
    /// No document is open
    NoDocument,
    /// A page is open but its first tile has not finished rendering
    Rendering,
    /// Blit the tile with its top-left corner at `offset` (device pixels,
    /// relative to the surface origin; may be negative)
    Tile {
        pixmap: &'a TilePixmap,
        offset: (i32, i32),
    },
}

/// The pixel surface the coordinator draws into.
///
/// Implementations fill their own background before placing the frame
/// content; the coordinator replaces the whole surface on every redraw.
pub trait PresentationSurface: Send + 'static {
    /// Current surface extent in device pixels
    fn size(&self) -> (u32, u32);

    /// Show `frame`. Called from the view coordinator thread only.
    fn present(&mut self, frame: Frame<'_>);
}
