//! Bubble Trouble - orbiting discussion rooms
//!
//! Core modules:
//! - `sim`: Deterministic orbit simulation (motion, repulsion, expiry, reflect)
//! - `feed`: Realtime bubble feed plumbing (snapshot + insert stream)
//! - `session`: Screen-level orchestration of feed, engine and collaborators
//! - `render`: Read-only projection for a rendering backend
//! - `settings`: Data-driven layout tuning

pub mod creation;
pub mod error;
pub mod feed;
pub mod leaderboard;
pub mod platform;
pub mod render;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::{CreateError, FeedError, NotFoundError, SettingsError, ValidationError};
pub use leaderboard::TopBubbles;
pub use session::Session;
pub use settings::{EngineSettings, LayoutPreset};

use glam::Vec2;

/// Engine configuration constants
pub mod consts {
    /// Bubble time-to-live (24 hours, in milliseconds)
    pub const BUBBLE_TTL_MS: i64 = 24 * 60 * 60 * 1000;
    /// How often stale bubbles are swept (seconds)
    pub const EXPIRY_INTERVAL_SECS: f32 = 60.0;
    /// How often the repulsion pass runs (seconds)
    pub const COLLISION_INTERVAL_SECS: f32 = 0.1;
    /// Largest frame delta the session will feed the engine
    pub const MAX_FRAME_DT: f32 = 0.25;

    /// Appear animation length (seconds)
    pub const APPEAR_SECS: f32 = 0.6;
    /// Peak overshoot of the appear bounce
    pub const APPEAR_BOUNCE: f32 = 0.2;

    /// Reflection count at which the color ramp saturates
    pub const COLOR_RAMP_COUNT: u32 = 5;
}

/// Wrap an angle into [0, 2π)
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::TAU;
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: Vec2) -> (f32, f32) {
    (pos.length(), pos.y.atan2(pos.x))
}
