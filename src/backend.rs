//! MuPDF-backed document engine

use std::path::{Path, PathBuf};

use log::debug;
use mupdf::{Colorspace, Device, Pixmap};

use crate::geometry::{IRect, Matrix, Rect};
use crate::page::{Document, PageHandle, RenderError};
use crate::tile::TilePixmap;

/// A PDF document on disk.
///
/// Each opened page gets its own engine instance, so page handles can move
/// to render worker threads independently of each other.
pub struct PdfDocument {
    path: PathBuf,
    page_count: usize,
}

impl PdfDocument {
    /// Open and validate the document at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let path = path.as_ref().to_path_buf();
        let doc = mupdf::Document::open(path.to_string_lossy().as_ref())?;
        let page_count = doc.page_count()? as usize;
        debug!("opened {} with {page_count} pages", path.display());
        Ok(Self { path, page_count })
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_count
    }
}

impl Document for PdfDocument {
    type Page = PdfPage;

    fn open_page(&self, index: usize) -> Result<PdfPage, RenderError> {
        if index >= self.page_count {
            return Err(RenderError::generic(format!(
                "page {index} out of range, document has {} pages",
                self.page_count
            )));
        }

        let doc = mupdf::Document::open(self.path.to_string_lossy().as_ref())?;
        let page = doc.load_page(index as i32)?;
        let bounds = page.bounds()?;

        Ok(PdfPage {
            bounds: Rect::new(bounds.x0, bounds.y0, bounds.x1, bounds.y1),
            page,
            _doc: doc,
        })
    }
}

/// A decoded PDF page owned by one render worker at a time
pub struct PdfPage {
    page: mupdf::Page,
    bounds: Rect,
    // the page borrows engine state from its document
    _doc: mupdf::Document,
}

// SAFETY: the handle is moved to a single render worker thread and never
// aliased; MuPDF objects tolerate crossing threads as long as access to
// them is serialized, which the worker ownership model guarantees.
unsafe impl Send for PdfPage {}

impl PageHandle for PdfPage {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn rotation(&self) -> i32 {
        // the engine folds /Rotate into the page bounds and content
        0
    }

    fn render(&mut self, viewport: IRect, transform: Matrix) -> Result<TilePixmap, RenderError> {
        // the engine hands out y-down content; bridge from the y-up page
        // contract the transform was built against
        let flip = Matrix::scale(1.0, -1.0).post_translate(0.0, self.bounds.y0 + self.bounds.y1);
        let ctm = flip.concat(&transform);

        let rect = mupdf::IRect::new(viewport.x0, viewport.y0, viewport.x1, viewport.y1);
        let colorspace = Colorspace::device_rgb();
        let mut pixmap = Pixmap::new_with_rect(&colorspace, rect, false)?;
        pixmap.clear_with(0xff)?;

        let device = Device::from_pixmap(&pixmap)?;
        self.page.run(
            &device,
            &mupdf::Matrix {
                a: ctm.a,
                b: ctm.b,
                c: ctm.c,
                d: ctm.d,
                e: ctm.e,
                f: ctm.f,
            },
        )?;

        let samples = pixmap_to_rgb(&pixmap)?;
        Ok(TilePixmap {
            viewport,
            width: pixmap.width(),
            height: pixmap.height(),
            samples,
        })
    }
}

/// Copy pixmap rows into a tightly packed RGB buffer
fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<Vec<u8>, RenderError> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(RenderError::generic(format!(
            "unsupported pixmap format: {n} channels"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err(RenderError::generic("pixmap buffer size mismatch"));
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row = &samples[y * stride..y * stride + row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }

    Ok(out)
}
