//! Deterministic orbit simulation
//!
//! All bubble motion and lifecycle logic lives here. This module must be pure
//! and deterministic:
//! - Time only through explicit deltas and an injected clock
//! - Injected randomness only
//! - Stable iteration order (arrival order)
//! - No rendering backend, transport or wall-clock access

pub mod bubble;
pub mod cadence;
pub mod collision;
pub mod engine;
pub mod rng;

pub use bubble::{Bubble, BubbleStatus, glow_curve};
pub use cadence::Cadence;
pub use collision::{CollisionResult, disc_overlap, resolve_collisions};
pub use engine::{EngineEvent, EngineStats, IngestOutcome, OrbitEngine};
pub use rng::{RandomSource, SeededRandom, SequenceRandom};
