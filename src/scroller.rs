//! Scroll and fling animation
//!
//! Interpolates offsets over time for programmatic scrolls and for flings
//! decelerating under constant friction. All methods take explicit
//! [`Instant`]s so the math is deterministic under test.

use std::time::{Duration, Instant};

use crate::geometry::IRect;

#[derive(Clone, Copy, Debug)]
enum Mode {
    /// Fixed-duration interpolation from start towards start + delta
    Scroll { dx: f32, dy: f32 },
    /// Velocity decaying linearly to zero, clamped to a range
    Fling {
        vx: f32,
        vy: f32,
        decel_x: f32,
        decel_y: f32,
        range: IRect,
    },
}

/// Animates scroll offsets through time
#[derive(Debug)]
pub struct Scroller {
    start: (f32, f32),
    curr: (i32, i32),
    start_time: Instant,
    duration: Duration,
    scroll_duration: Duration,
    friction: f32,
    mode: Mode,
    finished: bool,
}

impl Scroller {
    #[must_use]
    pub fn new(scroll_duration: Duration, friction: f32) -> Self {
        Self {
            start: (0.0, 0.0),
            curr: (0, 0),
            start_time: Instant::now(),
            duration: Duration::ZERO,
            scroll_duration,
            friction: friction.max(f32::EPSILON),
            mode: Mode::Scroll { dx: 0.0, dy: 0.0 },
            finished: true,
        }
    }

    /// Begin a smooth scroll by `(dx, dy)` from `(x, y)`
    pub fn start_scroll(&mut self, now: Instant, x: i32, y: i32, dx: f32, dy: f32) {
        self.start = (x as f32, y as f32);
        self.curr = (x, y);
        self.start_time = now;
        self.duration = self.scroll_duration;
        self.mode = Mode::Scroll { dx, dy };
        self.finished = false;
    }

    /// Begin a fling from `(x, y)` with the given velocity in pixels per
    /// second, coasting to rest inside `range`
    pub fn fling(&mut self, now: Instant, x: i32, y: i32, vx: f32, vy: f32, range: IRect) {
        let speed = (vx * vx + vy * vy).sqrt();
        if speed <= 0.0 {
            self.finished = true;
            return;
        }

        self.start = (x as f32, y as f32);
        self.curr = (x, y);
        self.start_time = now;
        self.duration = Duration::from_secs_f32(speed / self.friction);
        self.mode = Mode::Fling {
            vx,
            vy,
            decel_x: self.friction * vx / speed,
            decel_y: self.friction * vy / speed,
            range,
        };
        self.finished = false;
    }

    /// Advance the animation to `now`. Returns `false` when there is no
    /// active animation; otherwise updates the current offsets and returns
    /// `true`.
    pub fn compute_scroll_offset(&mut self, now: Instant) -> bool {
        if self.finished {
            return false;
        }

        let elapsed = now.saturating_duration_since(self.start_time);
        let t = elapsed.as_secs_f32().min(self.duration.as_secs_f32());

        match self.mode {
            Mode::Scroll { dx, dy } => {
                let total = self.duration.as_secs_f32();
                let fraction = if total > 0.0 { t / total } else { 1.0 };
                self.curr = (
                    (self.start.0 + dx * fraction).round() as i32,
                    (self.start.1 + dy * fraction).round() as i32,
                );
            }
            Mode::Fling {
                vx,
                vy,
                decel_x,
                decel_y,
                range,
            } => {
                let x = self.start.0 + vx * t - decel_x * t * t / 2.0;
                let y = self.start.1 + vy * t - decel_y * t * t / 2.0;
                self.curr = (
                    (x.round() as i32).clamp(range.x0, range.x1),
                    (y.round() as i32).clamp(range.y0, range.y1),
                );
            }
        }

        if elapsed >= self.duration {
            self.finished = true;
        }
        true
    }

    #[must_use]
    pub fn curr_x(&self) -> i32 {
        self.curr.0
    }

    #[must_use]
    pub fn curr_y(&self) -> i32 {
        self.curr.1
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Stop the animation at its current position
    pub fn abort_animation(&mut self) {
        self.finished = true;
    }
}
