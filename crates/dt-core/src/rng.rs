//! Deterministic per-worker and simulation-level RNG wrappers.
//!
//! # Determinism strategy
//!
//! Each worker gets its own independent `SmallRng` seeded by:
//!
//!   seed = global_seed XOR (worker_id * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive worker IDs uniformly across the seed space.
//! This means worker RNGs never share state (no contention, no ordering
//! dependency) and a fixed `(seed, worker_count)` pair always reproduces the
//! same stream, regardless of how work happens to interleave across threads.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::WorkerId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

// ── WorkerRng ─────────────────────────────────────────────────────────────────

/// Per-worker deterministic RNG, handed to operations that need randomness.
///
/// The type is `!Sync` to prevent accidental sharing across threads — each
/// Rayon worker holds its own instance, created once via `SimRng::child`.
pub struct WorkerRng(SmallRng);

impl WorkerRng {
    /// Seed deterministically from the run's global seed and a worker id.
    pub fn new(global_seed: u64, worker: WorkerId) -> Self {
        let seed = global_seed ^ (worker.0 as u64).wrapping_mul(MIXING_CONSTANT);
        WorkerRng(SmallRng::seed_from_u64(seed))
    }

    /// Expose the inner `SmallRng` for use with `rand` distribution types.
    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    #[inline]
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.0);
    }
}

// ── SimRng ────────────────────────────────────────────────────────────────────

/// Simulation-level RNG, owned by the `Scheduler`, used only to derive the
/// per-worker `WorkerRng`s at startup (and for any single-threaded global
/// randomness, e.g. load-balancing tie-breaks).
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Derive a `WorkerRng` for the given worker id from this run's seed.
    pub fn worker_rng(&self, seed: u64, worker: WorkerId) -> WorkerRng {
        WorkerRng::new(seed, worker)
    }

    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }
}
