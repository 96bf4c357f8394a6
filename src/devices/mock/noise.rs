//! Seedable random source for simulated devices
//!
//! Uniform draws only ("random value in a range, rounded"), not a physical
//! noise model.

use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::{Distribution, Uniform};

/// Noise generator with configurable seed for reproducibility
#[derive(Clone)]
pub struct NoiseGenerator {
    rng: SmallRng,
}

impl NoiseGenerator {
    /// Create a new noise generator
    ///
    /// If seed is 0, uses random entropy for non-deterministic behavior.
    /// Otherwise, uses the provided seed for reproducible results.
    pub fn new(seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self { rng }
    }

    /// Derive an independent generator (different stream, same determinism)
    pub fn fork(&mut self) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(self.rng.next_u64()),
        }
    }

    /// Uniform random in [low, high]
    #[inline]
    pub fn uniform(&mut self, low: f32, high: f32) -> f32 {
        if low >= high {
            return low;
        }
        Uniform::new_inclusive(low, high).sample(&mut self.rng)
    }

    /// Uniform random centered on `center` with half-width `spread`
    #[inline]
    pub fn around(&mut self, center: f32, spread: f32) -> f32 {
        center + self.uniform(-spread, spread)
    }
}
