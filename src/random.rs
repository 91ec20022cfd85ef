//! Seeded pseudo-random stream used to derive per-layer noise parameters.
//!
//! The stream never touches geometry; it only produces the phase offsets that
//! are written into compute kernel parameters.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic pseudo-random number generator seeded from an integer.
///
/// Backed by ChaCha8, whose output is identical on every platform, so the
/// same seed always yields the same parameter sequence.
#[derive(Debug, Clone)]
pub struct Prng {
    rng: ChaCha8Rng,
}

impl Prng {
    /// Creates a generator seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Returns the next value in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        self.rng.random::<f32>()
    }
}
