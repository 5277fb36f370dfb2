//! Injected randomness
//!
//! Per-bubble initial parameters (angle, speed, jitter, client id) come from a
//! `RandomSource` so runs are reproducible from a seed or a scripted sequence.

use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg32;

/// Source of uniform samples
pub trait RandomSource {
    /// Uniform sample in [0, 1)
    fn next_unit(&mut self) -> f32;

    /// 128 random bits, used for client-generated ids
    fn next_bytes(&mut self) -> [u8; 16];

    /// Uniform sample in [lo, hi); returns `lo` for an empty range
    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo {
            return lo;
        }
        let v = lo + (hi - lo) * self.next_unit();
        // float rounding can land exactly on `hi`
        if v >= hi { lo } else { v }
    }
}

/// PCG32 seeded from a `u64`
#[derive(Debug, Clone)]
pub struct SeededRandom {
    pub seed: u64,
    rng: Pcg32,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    fn next_bytes(&mut self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        bytes
    }
}

/// Replays a fixed list of unit samples, cycling when exhausted
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    values: Vec<f32>,
    cursor: usize,
    counter: u64,
}

impl SequenceRandom {
    /// Samples are clamped into [0, 1); an empty list yields zeros
    pub fn new(values: impl Into<Vec<f32>>) -> Self {
        Self {
            values: values.into(),
            cursor: 0,
            counter: 0,
        }
    }
}

impl RandomSource for SequenceRandom {
    fn next_unit(&mut self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v.clamp(0.0, 1.0 - f32::EPSILON)
    }

    fn next_bytes(&mut self) -> [u8; 16] {
        self.counter += 1;
        let mut bytes = [0u8; 16];
        bytes[8..].copy_from_slice(&self.counter.to_be_bytes());
        bytes
    }
}
