//! Frame-size noise models for the statistical codec
//!
//! The statistical codec passes every frame size through a [`NoiseModel`] right before
//! emitting it. The default, [`UniformNoise`], scales the size by a factor drawn uniformly
//! from `[1 - max_ratio, 1 + max_ratio]` using a seeded ChaCha8 RNG, so runs are
//! reproducible given the same seed. Any `FnMut(f64) -> f64` closure is also a noise model.
//!
//! ```rust
//! use syncodecs::noise::{NoiseModel, UniformNoise};
//!
//! let mut noise = UniformNoise::seeded(0.1, 7);
//! let noisy = noise.add_noise(1000.0);
//! assert!((900.0..=1100.0).contains(&noisy));
//!
//! let mut double = |size: f64| size * 2.0;
//! assert_eq!(double.add_noise(10.0), 20.0);
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Width of the default uniform noise distribution
pub const DEFAULT_NOISE_MAX_RATIO: f64 = 0.1;

/// Strategy applied to every emitted frame size
pub trait NoiseModel {
    /// Return the perturbed frame size (bytes, may be fractional)
    fn add_noise(&mut self, size: f64) -> f64;
}

impl<F> NoiseModel for F
where
    F: FnMut(f64) -> f64,
{
    fn add_noise(&mut self, size: f64) -> f64 {
        self(size)
    }
}

/// Multiplicative noise uniformly distributed in `[1 - max_ratio, 1 + max_ratio]`
#[derive(Debug, Clone)]
pub struct UniformNoise {
    max_ratio: f64,
    rng: ChaCha8Rng,
}

impl UniformNoise {
    /// Noise with a fixed seed
    pub fn seeded(max_ratio: f64, seed: u64) -> Self {
        Self { max_ratio: max_ratio.clamp(0.0, 1.0), rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    /// Noise seeded from the operating system
    pub fn from_entropy(max_ratio: f64) -> Self {
        Self { max_ratio: max_ratio.clamp(0.0, 1.0), rng: ChaCha8Rng::from_entropy() }
    }

    /// Largest relative deviation from the input size
    pub fn max_ratio(&self) -> f64 {
        self.max_ratio
    }
}

impl Default for UniformNoise {
    fn default() -> Self {
        Self::from_entropy(DEFAULT_NOISE_MAX_RATIO)
    }
}

impl NoiseModel for UniformNoise {
    fn add_noise(&mut self, size: f64) -> f64 {
        let factor = self.rng.gen_range((1.0 - self.max_ratio)..=(1.0 + self.max_ratio));
        size * factor
    }
}

/// Leaves frame sizes untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNoise;

impl NoiseModel for NoNoise {
    fn add_noise(&mut self, size: f64) -> f64 {
        size
    }
}
