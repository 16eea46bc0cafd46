//! Tiled background rendering for scrollable, zoomable document views.
//!
//! Rendering a full page eagerly is too slow for interactive scrolling, so
//! this crate keeps a [`PageView`] responsive by splitting the work across
//! three threads: the application thread produces input events, a view
//! coordinator owns scroll state and decides which excerpt of the page is
//! worth rasterizing next, and a render worker drains a coalescing
//! two-slot job queue with a debounced lazy start. Only the most recently
//! requested viewport is ever rendered; stale intermediate scroll
//! positions are skipped.
//!
//! The document engine is abstracted behind the [`Document`] and
//! [`PageHandle`] traits; a MuPDF-backed implementation is available with
//! the `pdf` feature (enabled by default).

pub mod geometry;
pub mod page;
pub mod scroller;
pub mod surface;
pub mod tile;
pub mod transform;
pub mod view;

mod queue;
mod worker;

#[cfg(feature = "pdf")]
pub mod backend;

pub use geometry::{IRect, Matrix, Point, Rect};
pub use page::{Document, PageHandle, RenderError};
pub use surface::{Frame, PresentationSurface};
pub use tile::{TilePixmap, ViewConfig};
pub use transform::{PageLayout, ZoomSpec};
pub use view::{Notice, PageView};

#[cfg(feature = "pdf")]
pub use backend::{PdfDocument, PdfPage};
