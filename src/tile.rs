//! Rendered tile data and engine configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::IRect;

/// A rendered excerpt of the full page pixel canvas.
///
/// Produced wholesale by the render worker and handed to the view
/// coordinator behind an `Arc`; the buffer is never mutated after
/// publication.
#[derive(Clone)]
pub struct TilePixmap {
    /// The tile's box in full-page pixel coordinates
    pub viewport: IRect,
    /// Tile width in pixels
    pub width: u32,
    /// Tile height in pixels
    pub height: u32,
    /// Raw RGB pixel data (3 bytes per pixel: R, G, B)
    pub samples: Vec<u8>,
}

impl std::fmt::Debug for TilePixmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TilePixmap")
            .field("viewport", &self.viewport)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("samples_len", &self.samples.len())
            .finish()
    }
}

/// Tuning knobs for the tile pipeline
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Maximum width of a rendered tile in pixels. Usually a multiple of
    /// the display width so several scroll steps stay inside one tile.
    pub tile_max_width: u32,

    /// Maximum height of a rendered tile in pixels
    pub tile_max_height: u32,

    /// Debounce before a queued render job starts, in milliseconds.
    /// A newer job submitted during the wait restarts it.
    pub lazy_render_ms: u64,

    /// Duration of a programmatic scroll animation in milliseconds
    pub scroll_duration_ms: u64,

    /// Fling deceleration in pixels per second squared
    pub fling_friction: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            tile_max_width: 512,
            tile_max_height: 512,
            lazy_render_ms: 250,
            scroll_duration_ms: 250,
            fling_friction: 2000.0,
        }
    }
}

impl ViewConfig {
    #[must_use]
    pub fn lazy_render(&self) -> Duration {
        Duration::from_millis(self.lazy_render_ms)
    }

    #[must_use]
    pub fn scroll_duration(&self) -> Duration {
        Duration::from_millis(self.scroll_duration_ms)
    }
}
