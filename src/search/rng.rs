//! Seedable random number generator shared by the engine and the spaces.

use rand::prelude::*;
use rand_distr::StandardNormal;

/// Random number generator wrapper for sampling, mutation and crossover.
///
/// Implements [`RngCore`], so every [`Rng`] method is available to space
/// authors in addition to the helpers below.
#[derive(Debug, Clone)]
pub struct SearchRng {
    rng: StdRng,
}

impl SearchRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Uniform random in inclusive bounds.
    pub fn uniform(&mut self, bounds: (f64, f64)) -> f64 {
        if empty(bounds) {
            return bounds.0;
        }
        self.rng.gen_range(bounds.0..=bounds.1)
    }

    /// Gaussian perturbation of `value` with standard deviation `sigma`,
    /// clamped to `bounds`. Empty or inverted bounds give `bounds.0`, as in
    /// [`Self::uniform`].
    pub fn gaussian(&mut self, value: f64, sigma: f64, bounds: (f64, f64)) -> f64 {
        if empty(bounds) {
            return bounds.0;
        }
        let noise: f64 = self.rng.sample(StandardNormal);
        (value + noise * sigma).clamp(bounds.0, bounds.1)
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

fn empty(bounds: (f64, f64)) -> bool {
    bounds.0.is_nan() || bounds.1.is_nan() || bounds.0 >= bounds.1
}

impl RngCore for SearchRng {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = SearchRng::new(7);
        let mut b = SearchRng::new(7);
        for _ in 0..10 {
            assert_eq!(a.uniform((0.0, 1.0)), b.uniform((0.0, 1.0)));
        }
    }

    #[test]
    fn test_uniform_in_bounds() {
        let mut rng = SearchRng::new(42);
        for _ in 0..100 {
            let x = rng.uniform((2.0, 3.0));
            assert!((2.0..=3.0).contains(&x));
        }
        assert_eq!(rng.uniform((5.0, 5.0)), 5.0);
    }

    #[test]
    fn test_gaussian_clamped() {
        let mut rng = SearchRng::new(42);
        for _ in 0..100 {
            let x = rng.gaussian(0.5, 10.0, (0.0, 1.0));
            assert!((0.0..=1.0).contains(&x));
        }
    }

    #[test]
    fn test_gaussian_inverted_bounds() {
        let mut rng = SearchRng::new(42);
        assert_eq!(rng.gaussian(5.0, 1.0, (10.0, 0.0)), 10.0);
        assert_eq!(rng.gaussian(5.0, 1.0, (3.0, 3.0)), 3.0);
        assert!(rng.gaussian(5.0, 1.0, (f64::NAN, 1.0)).is_nan());
        assert_eq!(rng.uniform((3.0, f64::NAN)), 3.0);
    }
}
