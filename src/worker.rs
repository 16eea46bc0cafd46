//! Render worker - one dedicated thread per open page
//!
//! The worker drains a coalescing job queue: at most one job is in flight
//! and at most the newest submission waits behind it. Each job carries a
//! lazy-start delay; a newer submission arriving during the wait replaces
//! the job and restarts the debounce, so rapid scroll input settles before
//! any expensive rasterization begins.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use flume::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::{debug, warn};

use crate::geometry::{IRect, Matrix};
use crate::page::PageHandle;
use crate::queue::{JobMsg, RenderJob};
use crate::tile::TilePixmap;

/// Owning handle for a render worker thread.
///
/// Dropping (or calling [`shutdown`](RenderWorker::shutdown)) signals the
/// worker and joins it, so the page handle is guaranteed released once the
/// call returns; no two workers can ever hold the same page.
pub(crate) struct RenderWorker {
    jobs: Sender<JobMsg>,
    last_viewport: Option<IRect>,
    thread: Option<JoinHandle<()>>,
}

impl RenderWorker {
    /// Move `page` onto a new worker thread. `on_tile` is invoked from the
    /// worker for every completed render.
    pub fn spawn<P, F>(page: P, on_tile: F) -> Self
    where
        P: PageHandle,
        F: FnMut(Arc<TilePixmap>) + Send + 'static,
    {
        let (tx, rx) = flume::unbounded();

        let thread = std::thread::Builder::new()
            .name("tile-render".into())
            .spawn(move || render_worker(page, &rx, on_tile))
            .expect("failed to spawn render worker thread");

        Self {
            jobs: tx,
            last_viewport: None,
            thread: Some(thread),
        }
    }

    /// Queue a tile for rendering. A submission whose viewport matches the
    /// previous one is discarded; the earlier job (possibly already
    /// rendered) covers it.
    pub fn submit(&mut self, viewport: IRect, transform: Matrix, delay: Duration) -> bool {
        if self.last_viewport == Some(viewport) {
            debug!("tile {viewport:?} already queued, ignoring");
            return false;
        }
        self.last_viewport = Some(viewport);

        debug!("new render job: {viewport:?}");
        self.jobs
            .send(JobMsg::Render(RenderJob {
                viewport,
                transform,
                delay,
            }))
            .is_ok()
    }

    /// Stop the worker and wait for it to release the page
    pub fn shutdown(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.jobs.send(JobMsg::Shutdown);
            let _ = thread.join();
        }
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        self.halt();
    }
}

/// Worker loop. Exits on a shutdown message or when all senders are gone;
/// the page is dropped (released) on the way out.
fn render_worker<P: PageHandle>(
    mut page: P,
    jobs: &Receiver<JobMsg>,
    mut on_tile: impl FnMut(Arc<TilePixmap>),
) {
    loop {
        let job = match jobs.recv() {
            Ok(JobMsg::Render(job)) => job,
            Ok(JobMsg::Shutdown) | Err(_) => break,
        };

        let Some(job) = settle(job, jobs) else { break };

        debug!("rendering tile {:?}", job.viewport);
        match page.render(job.viewport, job.transform) {
            Ok(tile) => on_tile(Arc::new(tile)),
            // not fatal; the view keeps its previous tile
            Err(e) => warn!("tile render failed: {e}"),
        }
    }
    debug!("render worker shutting down");
}

/// Wait out the job's lazy-start delay. Any newer submission replaces the
/// job and restarts the debounce with its own delay; only the latest
/// submission survives. Returns `None` on shutdown.
fn settle(mut job: RenderJob, jobs: &Receiver<JobMsg>) -> Option<RenderJob> {
    loop {
        // take everything already queued; the newest submission wins
        loop {
            match jobs.try_recv() {
                Ok(JobMsg::Render(newer)) => job = newer,
                Ok(JobMsg::Shutdown) | Err(TryRecvError::Disconnected) => return None,
                Err(TryRecvError::Empty) => break,
            }
        }

        if job.delay.is_zero() {
            return Some(job);
        }

        match jobs.recv_timeout(job.delay) {
            Ok(JobMsg::Render(newer)) => {
                debug!("debounce restarted by {:?}", newer.viewport);
                job = newer;
            }
            Ok(JobMsg::Shutdown) | Err(RecvTimeoutError::Disconnected) => return None,
            Err(RecvTimeoutError::Timeout) => return Some(job),
        }
    }
}
