//! Platform abstraction layer
//!
//! Handles host differences for:
//! - Wall-clock time (epoch millis)

pub mod time;

pub use time::{Clock, ManualClock, SystemClock};
