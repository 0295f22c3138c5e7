//! Random draws consumed by the population controller.
//!
//! The controller only needs two kinds of draws: a uniform value in `[0, 1)`
//! for the per-direction connection trials, and a standard-normal value for
//! interaction weights. Both come from one sequential stream so a seed fully
//! determines a trajectory.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

pub trait RandomSource {
    /// Uniform draw in [0, 1)
    fn uniform(&mut self) -> f64;

    /// Standard-normal draw
    fn normal(&mut self) -> f64;
}

/// `StdRng` seeded from a u64
pub struct SeededRandom {
    rng: StdRng,
    seed: u64,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRandom {
    fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn normal(&mut self) -> f64 {
        self.rng.sample(StandardNormal)
    }
}
