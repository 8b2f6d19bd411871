//! # RandomNumberGenerator
//!
//! The `RandomNumberGenerator` struct is the single source of randomness for the engine.
//! It wraps the `rand` crate's `StdRng`, remembers the seed it was started from, and is
//! passed explicitly to every operator that needs to draw numbers, so two runs started
//! from the same seed are identical.
//!
//! ## Example
//!
//! ```rust
//! use gaforge::rng::RandomNumberGenerator;
//!
//! let mut a = RandomNumberGenerator::from_seed(7);
//! let mut b = RandomNumberGenerator::from_seed(7);
//!
//! assert_eq!(a.random_int(0, 100), b.random_int(0, 100));
//! assert_eq!(a.flip_coin(0.5), b.flip_coin(0.5));
//! ```
//!
//! ## Seeding
//!
//! `seed(0)` keeps the current stream; any other value restarts the stream from that seed.

use rand::distributions::uniform::SampleUniform;
use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};
use rand_distr::StandardNormal;
use std::collections::VecDeque;

/// A seeded wrapper around `StdRng` providing the draws a genetic algorithm needs.
#[derive(Clone, Debug)]
pub struct RandomNumberGenerator {
    rng: StdRng,
    seed: u64,
}

impl RandomNumberGenerator {
    /// Creates a new generator from a seed drawn from system entropy.
    ///
    /// The seed is recorded so that a run can be reproduced later with [`from_seed`].
    ///
    /// [`from_seed`]: RandomNumberGenerator::from_seed
    pub fn new() -> Self {
        Self::from_seed(Self::entropy_seed())
    }

    /// Creates a new generator with a specific seed.
    ///
    /// A seed of `0` is replaced by an entropy seed, since `0` means "keep whatever you have".
    pub fn from_seed(seed: u64) -> Self {
        let seed = if seed == 0 { Self::entropy_seed() } else { seed };
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    fn entropy_seed() -> u64 {
        let mut seed = 0;
        while seed == 0 {
            seed = rand::thread_rng().next_u64();
        }
        seed
    }

    /// Returns the seed the current stream was started from.
    pub fn current_seed(&self) -> u64 {
        self.seed
    }

    /// Reseeds the generator.
    ///
    /// `0` leaves the stream untouched. Any other value restarts the stream from that seed,
    /// even when it equals the current one.
    pub fn seed(&mut self, seed: u64) {
        if seed != 0 {
            self.reset(seed);
        }
    }

    /// Restarts the stream. A seed of `0` draws a fresh seed from system entropy.
    pub fn reset(&mut self, seed: u64) {
        *self = Self::from_seed(seed);
    }

    /// Returns a uniform value in `[low, high]`. The bounds may be given in either order.
    pub fn random_int<T>(&mut self, low: T, high: T) -> T
    where
        T: SampleUniform + PartialOrd + Copy,
    {
        if high < low {
            self.rng.gen_range(high..=low)
        } else {
            self.rng.gen_range(low..=high)
        }
    }

    /// Returns a uniform value in `[0, 1)`.
    pub fn random_float(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    /// Returns a uniform value in `[low, high)`, or `low` when the range is empty.
    pub fn random_float_range(&mut self, low: f32, high: f32) -> f32 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..high)
    }

    /// Returns a uniform value in `[0, 1)`.
    pub fn random_double(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Returns a uniform value in `[low, high)`, or `low` when the range is empty.
    pub fn random_double_range(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..high)
    }

    /// Returns a fair random bit.
    pub fn random_bit(&mut self) -> bool {
        self.rng.gen::<bool>()
    }

    /// Returns `true` with probability `p`.
    ///
    /// `p >= 1` is always `true` and `p <= 0` is always `false`, without consuming a draw.
    pub fn flip_coin(&mut self, p: f32) -> bool {
        if p >= 1.0 {
            true
        } else if p <= 0.0 {
            false
        } else {
            self.random_float() <= p
        }
    }

    /// Returns a normal deviate with mean `0` and standard deviation `dev`.
    pub fn gaussian(&mut self, dev: f64) -> f64 {
        let unit: f64 = self.rng.sample(StandardNormal);
        unit * dev
    }

    /// Returns a random index in `0..len`. `len` must be non-zero.
    pub fn random_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Generates `num` uniform values in `[from, to)`.
    pub fn fetch_uniform(&mut self, from: f32, to: f32, num: usize) -> VecDeque<f32> {
        let mut uniform_numbers = VecDeque::with_capacity(num);
        uniform_numbers.extend((0..num).map(|_| self.random_float_range(from, to)));
        uniform_numbers
    }

    /// Gives direct access to the underlying generator for `rand` adaptors such as
    /// `SliceRandom`.
    pub fn inner(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl Default for RandomNumberGenerator {
    fn default() -> Self {
        Self::new()
    }
}
