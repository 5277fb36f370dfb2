//! Fixed-interval schedules driven by frame time
//!
//! Frames arrive at whatever rate the host renders; slower passes
//! (repulsion, expiry sweep) accumulate frame time and fire once per
//! elapsed interval.

/// Accumulator that fires every `interval` seconds of frame time
#[derive(Debug, Clone)]
pub struct Cadence {
    interval: f32,
    accumulator: f32,
    cancelled: bool,
}

impl Cadence {
    pub fn new(interval: f32) -> Self {
        Self {
            interval: interval.max(f32::EPSILON),
            accumulator: 0.0,
            cancelled: false,
        }
    }

    /// Add `dt` seconds. Returns true if at least one interval elapsed;
    /// several elapsed intervals collapse into a single firing.
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.cancelled || !(dt > 0.0) {
            return false;
        }
        self.accumulator += dt;
        if self.accumulator < self.interval {
            return false;
        }
        self.accumulator %= self.interval;
        true
    }

    /// Stop firing permanently
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.accumulator = 0.0;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }
}
