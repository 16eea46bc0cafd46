//! View coordinator - scroll state, tile decisions, drawing
//!
//! One coordinator thread per [`PageView`]. It owns the scroll offset, the
//! presentation surface and the render worker, and it is driven entirely
//! by channel messages: input events from the application thread and
//! completed tiles from the worker. Each wake-up evaluates the dirty flags
//! in a fixed order - frame, position, pixmap, redraw - so geometry is
//! settled before the offset is clamped, the offset is final before a tile
//! is requested, and a tile decision precedes drawing.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError, Sender};
use log::{debug, error};

use crate::geometry::{IRect, Matrix};
use crate::page::{Document, PageHandle, RenderError};
use crate::scroller::Scroller;
use crate::surface::{Frame, PresentationSurface};
use crate::tile::{TilePixmap, ViewConfig};
use crate::transform::{PageLayout, ZoomSpec};
use crate::worker::RenderWorker;

/// Animation frame pacing while a scroll or fling is in progress
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Events that wake the coordinator thread
enum ViewEvent<D: Document> {
    Scroll {
        dx: f32,
        dy: f32,
    },
    Fling {
        vx: f32,
        vy: f32,
    },
    SurfaceResized,
    OpenPage {
        doc: Arc<D>,
        page: usize,
        zoom: ZoomSpec,
        rotation: i32,
        dpi: (i32, i32),
    },
    ClosePage,
    /// Completed tile from the render worker, tagged with the worker
    /// generation that produced it
    TileReady(u64, Arc<TilePixmap>),
    Shutdown,
}

/// Out-of-band notifications for the embedding application
#[derive(Debug)]
pub enum Notice {
    /// A new tile was published and will be drawn
    TileRendered { viewport: IRect },
    /// The requested page could not be opened; a placeholder is shown
    PageLoadFailed { page: usize, error: RenderError },
}

/// A scrollable, zoomable view of one document page.
///
/// Spawns the coordinator thread on construction; dropping the view shuts
/// the coordinator (and any render worker) down and joins both.
pub struct PageView<D: Document> {
    events: Sender<ViewEvent<D>>,
    notices: Receiver<Notice>,
    thread: Option<JoinHandle<()>>,
}

impl<D: Document> PageView<D> {
    #[must_use]
    pub fn new<S: PresentationSurface>(surface: S, config: ViewConfig) -> Self {
        let (events_tx, events_rx) = flume::unbounded();
        let (notices_tx, notices_rx) = flume::unbounded();

        let worker_tx = events_tx.clone();
        let thread = std::thread::Builder::new()
            .name("tile-view".into())
            .spawn(move || {
                Coordinator::new(surface, config, events_rx, worker_tx, notices_tx).run();
            })
            .expect("failed to spawn view coordinator thread");

        Self {
            events: events_tx,
            notices: notices_rx,
            thread: Some(thread),
        }
    }

    /// Tear down any current page, open page `page` of `doc` and start
    /// rendering. Failures surface as [`Notice::PageLoadFailed`].
    pub fn open_page(
        &self,
        doc: Arc<D>,
        page: usize,
        zoom: ZoomSpec,
        rotation: i32,
        dpi_x: i32,
        dpi_y: i32,
    ) {
        let _ = self.events.send(ViewEvent::OpenPage {
            doc,
            page,
            zoom,
            rotation,
            dpi: (dpi_x, dpi_y),
        });
    }

    /// Close the current page; subsequent draws show the no-document
    /// placeholder. Safe to call when nothing is open.
    pub fn close_page(&self) {
        let _ = self.events.send(ViewEvent::ClosePage);
    }

    /// Scroll by a pointer delta in device pixels
    pub fn scroll(&self, dx: f32, dy: f32) {
        let _ = self.events.send(ViewEvent::Scroll { dx, dy });
    }

    /// Start a fling with the given pointer velocity in pixels per second
    pub fn fling(&self, vx: f32, vy: f32) {
        let _ = self.events.send(ViewEvent::Fling { vx, vy });
    }

    /// Notify the view that the surface extent changed
    pub fn surface_resized(&self) {
        let _ = self.events.send(ViewEvent::SurfaceResized);
    }

    /// Receiver for completion and failure notices
    #[must_use]
    pub fn notices(&self) -> &Receiver<Notice> {
        &self.notices
    }
}

impl<D: Document> Drop for PageView<D> {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.events.send(ViewEvent::Shutdown);
            let _ = thread.join();
        }
    }
}

struct Coordinator<D: Document, S: PresentationSurface> {
    surface: S,
    config: ViewConfig,
    events: Receiver<ViewEvent<D>>,
    /// Cloned into worker completion callbacks
    self_tx: Sender<ViewEvent<D>>,
    notices: Sender<Notice>,

    worker: Option<RenderWorker>,
    /// Bumped on every page open/close; tiles from older workers are stale
    generation: u64,

    page_size: IRect,
    page_matrix: Matrix,
    scrollable: IRect,
    offset: (i32, i32),
    tile: Option<Arc<TilePixmap>>,
    page_loaded: bool,
    scroller: Scroller,

    frame_dirty: bool,
    position_dirty: bool,
    pixmap_dirty: bool,
    redraw: bool,
    running: bool,
}

impl<D: Document, S: PresentationSurface> Coordinator<D, S> {
    fn new(
        surface: S,
        config: ViewConfig,
        events: Receiver<ViewEvent<D>>,
        self_tx: Sender<ViewEvent<D>>,
        notices: Sender<Notice>,
    ) -> Self {
        let scroller = Scroller::new(config.scroll_duration(), config.fling_friction);
        Self {
            surface,
            config,
            events,
            self_tx,
            notices,
            worker: None,
            generation: 0,
            page_size: IRect::ZERO,
            page_matrix: Matrix::IDENTITY,
            scrollable: IRect::ZERO,
            offset: (0, 0),
            tile: None,
            page_loaded: false,
            scroller,
            frame_dirty: false,
            position_dirty: false,
            pixmap_dirty: false,
            redraw: true,
            running: true,
        }
    }

    fn run(mut self) {
        while self.running {
            self.wait_for_events();
            if !self.running {
                break;
            }
            self.pump();
        }
        self.teardown_worker();
        debug!("view coordinator shutting down");
    }

    fn has_work(&self) -> bool {
        self.frame_dirty || self.position_dirty || self.pixmap_dirty || self.redraw
    }

    fn wait_for_events(&mut self) {
        if self.position_dirty {
            // keep animating, but stay interruptible
            match self.events.recv_timeout(FRAME_INTERVAL) {
                Ok(event) => self.apply(event),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    self.running = false;
                    return;
                }
            }
        } else if !self.has_work() {
            // nothing to do until someone wakes us
            match self.events.recv() {
                Ok(event) => self.apply(event),
                Err(_) => {
                    self.running = false;
                    return;
                }
            }
        }

        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
            if !self.running {
                return;
            }
        }
    }

    fn apply(&mut self, event: ViewEvent<D>) {
        match event {
            ViewEvent::Scroll { dx, dy } => {
                if !self.scroller.is_finished() {
                    self.scroller.abort_animation();
                }
                self.scroller
                    .start_scroll(Instant::now(), self.offset.0, self.offset.1, dx, dy);
                self.position_dirty = true;
            }

            ViewEvent::Fling { vx, vy } => {
                if !self.scroller.is_finished() {
                    self.scroller.abort_animation();
                }
                // pointer velocity is opposite to scroll direction
                self.scroller.fling(
                    Instant::now(),
                    self.offset.0,
                    self.offset.1,
                    -vx,
                    -vy,
                    self.scrollable,
                );
                self.position_dirty = true;
            }

            ViewEvent::SurfaceResized => {
                self.frame_dirty = true;
            }

            ViewEvent::OpenPage {
                doc,
                page,
                zoom,
                rotation,
                dpi,
            } => self.open_page(&doc, page, zoom, rotation, dpi),

            ViewEvent::ClosePage => {
                self.close_page();
                self.redraw = true;
            }

            ViewEvent::TileReady(generation, tile) => {
                if generation != self.generation {
                    debug!("dropping stale tile {:?}", tile.viewport);
                    return;
                }
                debug!("new tile ready: {:?}", tile.viewport);
                let _ = self.notices.send(Notice::TileRendered {
                    viewport: tile.viewport,
                });
                self.tile = Some(tile);
                self.redraw = true;
            }

            ViewEvent::Shutdown => {
                self.running = false;
            }
        }
    }

    /// One dirty-flag evaluation cycle
    fn pump(&mut self) {
        if self.frame_dirty {
            self.scrollable = scrollable_range(self.page_size, self.surface.size());
            self.offset = clamp_offset(self.offset, self.scrollable);
            self.frame_dirty = false;
            self.pixmap_dirty = true;
            self.redraw = true;
        }

        if self.position_dirty {
            if self.scroller.compute_scroll_offset(Instant::now()) {
                self.offset = (self.scroller.curr_x(), self.scroller.curr_y());
            }
            if self.scroller.is_finished() {
                self.position_dirty = false;
            }
            self.offset = clamp_offset(self.offset, self.scrollable);
            self.pixmap_dirty = true;
            self.redraw = true;
        }

        if self.pixmap_dirty {
            if self.page_loaded && self.needs_new_tile() {
                // first paint renders immediately, scrolling debounces
                let delay = if self.tile.is_some() {
                    self.config.lazy_render()
                } else {
                    Duration::ZERO
                };
                let viewport = centered_viewport(
                    self.visible_viewport(),
                    self.page_size,
                    (self.config.tile_max_width, self.config.tile_max_height),
                );
                if let Some(worker) = &mut self.worker {
                    worker.submit(viewport, self.page_matrix, delay);
                }
            }
            self.pixmap_dirty = false;
            // no redraw for this flag alone; the completed tile triggers it
        }

        if self.redraw {
            self.redraw = false;
            self.draw();
        }
    }

    /// The part of the page currently on screen, in page pixel coordinates
    fn visible_viewport(&self) -> IRect {
        let (width, height) = self.surface.size();
        let mut visible = IRect::new(
            self.offset.0,
            self.offset.1,
            self.offset.0 + width as i32,
            self.offset.1 + height as i32,
        );
        visible.x1 = visible.x1.min(self.page_size.x1);
        visible.y1 = visible.y1.min(self.page_size.y1);
        visible
    }

    fn needs_new_tile(&self) -> bool {
        match &self.tile {
            None => true,
            Some(tile) => !tile.viewport.contains(&self.visible_viewport()),
        }
    }

    fn open_page(&mut self, doc: &D, page_no: usize, zoom: ZoomSpec, rotation: i32, dpi: (i32, i32)) {
        self.close_page();

        let page = match doc.open_page(page_no) {
            Ok(page) => page,
            Err(error) => {
                error!("page {page_no} failed to open: {error}");
                let _ = self.notices.send(Notice::PageLoadFailed {
                    page: page_no,
                    error,
                });
                self.frame_dirty = true;
                return;
            }
        };

        let layout = PageLayout::compute(
            page.bounds(),
            page.rotation(),
            rotation,
            zoom,
            dpi,
            self.surface.size(),
        );
        debug!(
            "opened page {page_no}: {:?} at zoom {}",
            layout.page_size, layout.zoom
        );

        self.page_matrix = layout.matrix;
        self.page_size = layout.page_size;
        self.offset = (0, 0);

        let generation = self.generation;
        let tx = self.self_tx.clone();
        self.worker = Some(RenderWorker::spawn(page, move |tile| {
            let _ = tx.send(ViewEvent::TileReady(generation, tile));
        }));
        self.page_loaded = true;
        self.frame_dirty = true;
    }

    /// Tear down the current page, if any. The worker join guarantees the
    /// page handle is released before this returns.
    fn close_page(&mut self) {
        self.teardown_worker();
        self.generation += 1;
        self.page_loaded = false;
        self.tile = None;
        self.page_size = IRect::ZERO;
        self.scrollable = IRect::ZERO;
        self.scroller.abort_animation();
        self.position_dirty = false;
    }

    fn teardown_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            debug!("shutting down the render worker");
            worker.shutdown();
        }
    }

    fn draw(&mut self) {
        if !self.page_loaded {
            self.surface.present(Frame::NoDocument);
        } else if let Some(tile) = &self.tile {
            self.surface.present(Frame::Tile {
                pixmap: tile,
                offset: (
                    tile.viewport.x0 - self.offset.0,
                    tile.viewport.y0 - self.offset.1,
                ),
            });
        } else {
            self.surface.present(Frame::Rendering);
        }
    }
}

/// Valid range for the scroll offset: the page size minus the surface
/// size, collapsing to a zero-width range when the page is smaller.
fn scrollable_range(page: IRect, surface: (u32, u32)) -> IRect {
    let mut range = IRect::new(
        page.x0,
        page.y0,
        page.x1 - surface.0 as i32,
        page.y1 - surface.1 as i32,
    );
    if range.x1 < range.x0 {
        range.x1 = range.x0;
    }
    if range.y1 < range.y0 {
        range.y1 = range.y0;
    }
    range
}

/// Clamp an offset into the scrollable range
fn clamp_offset(offset: (i32, i32), range: IRect) -> (i32, i32) {
    (
        offset.0.clamp(range.x0, range.x1),
        offset.1.clamp(range.y0, range.y1),
    )
}

/// Tile viewport of at most `tile_max` pixels centered on the visible
/// area, shifted edge by edge so it never leaves the page.
fn centered_viewport(visible: IRect, page: IRect, tile_max: (u32, u32)) -> IRect {
    let half_x = tile_max.0 as i32 / 2;
    let half_y = tile_max.1 as i32 / 2;
    let mut viewport = IRect::new(
        visible.center_x() - half_x,
        visible.center_y() - half_y,
        visible.center_x() + half_x,
        visible.center_y() + half_y,
    );

    if viewport.x1 > page.x1 {
        viewport.x0 -= viewport.x1 - page.x1;
        viewport.x1 = page.x1;
    }
    if viewport.x0 < page.x0 {
        viewport.x1 += page.x0 - viewport.x0;
        viewport.x1 = viewport.x1.min(page.x1);
        viewport.x0 = page.x0;
    }
    if viewport.y1 > page.y1 {
        viewport.y0 -= viewport.y1 - page.y1;
        viewport.y1 = page.y1;
    }
    if viewport.y0 < page.y0 {
        viewport.y1 += page.y0 - viewport.y0;
        viewport.y1 = viewport.y1.min(page.y1);
        viewport.y0 = page.y0;
    }
    viewport
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrollable_range_collapses_for_small_pages() {
        let page = IRect::new(0, 0, 400, 300);
        let range = scrollable_range(page, (800, 600));
        assert_eq!(range, IRect::new(0, 0, 0, 0));
    }

    #[test]
    fn scrollable_range_for_large_pages() {
        let page = IRect::new(0, 0, 1200, 1600);
        let range = scrollable_range(page, (800, 600));
        assert_eq!(range, IRect::new(0, 0, 400, 1000));
    }

    #[test]
    fn clamping_is_idempotent() {
        let cases = [
            ((50, 50), IRect::new(0, 0, 400, 1000)),
            ((-10, 2000), IRect::new(0, 0, 400, 1000)),
            ((9999, -9999), IRect::new(0, 0, 0, 0)),
            ((3, 4), IRect::new(0, 0, 0, 0)),
        ];
        for (offset, range) in cases {
            let once = clamp_offset(offset, range);
            let twice = clamp_offset(once, range);
            assert_eq!(once, twice);
            assert!(once.0 >= range.x0 && once.0 <= range.x1);
            assert!(once.1 >= range.y0 && once.1 <= range.y1);
        }
    }

    #[test]
    fn centered_viewport_centers_on_visible_area() {
        let page = IRect::new(0, 0, 2000, 2000);
        let visible = IRect::new(900, 900, 1100, 1100);
        let viewport = centered_viewport(visible, page, (512, 512));
        assert_eq!(viewport, IRect::new(744, 744, 1256, 1256));
    }

    #[test]
    fn centered_viewport_shifts_inward_at_page_edges() {
        let page = IRect::new(0, 0, 2000, 2000);

        // visible area hugging the top-left corner
        let visible = IRect::new(0, 0, 200, 200);
        let viewport = centered_viewport(visible, page, (512, 512));
        assert_eq!(viewport, IRect::new(0, 0, 512, 512));

        // and the bottom-right corner
        let visible = IRect::new(1800, 1800, 2000, 2000);
        let viewport = centered_viewport(visible, page, (512, 512));
        assert_eq!(viewport, IRect::new(1488, 1488, 2000, 2000));
    }

    #[test]
    fn centered_viewport_never_leaves_small_pages() {
        let page = IRect::new(0, 0, 300, 200);
        let visible = IRect::new(0, 0, 300, 200);
        let viewport = centered_viewport(visible, page, (512, 512));
        assert_eq!(viewport, page);
        assert!(page.contains(&viewport));
    }
}
