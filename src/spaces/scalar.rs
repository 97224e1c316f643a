//! One-dimensional bounded scalar space.

use std::hash::{Hash, Hasher};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::search::{Configuration, ConfigurationSpace, Operators, Result, SearchRng, TypeTag};

const SCALAR_TAG: &str = "scalar";

/// A single real parameter.
///
/// Compared and hashed by bit pattern, so two scalars are the same
/// configuration only when they are bitwise identical.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scalar(pub f64);

impl Scalar {
    /// The wrapped value.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl Configuration for Scalar {
    fn type_tag(&self) -> TypeTag {
        TypeTag::from(SCALAR_TAG)
    }
}

/// Scalars in a closed range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarSpace {
    /// Sampling and clamping range.
    pub bounds: (f64, f64),
    /// Initial mutation standard deviation as a fraction of the range width.
    pub strength: f64,
    /// Per-round multiplicative decay of the mutation standard deviation.
    pub decay: f64,
}

impl Default for ScalarSpace {
    fn default() -> Self {
        Self::new((0.0, 1.0))
    }
}

impl ScalarSpace {
    /// Create a space over `bounds` with default mutation settings.
    pub fn new(bounds: (f64, f64)) -> Self {
        Self {
            bounds,
            strength: 0.1,
            decay: 0.8,
        }
    }

    /// Set the mutation strength.
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    /// Set the mutation decay.
    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    /// Shrink the range to its intersection with `[lo, hi]`.
    ///
    /// Leaves the range unchanged if the intersection is empty.
    pub fn narrow(&mut self, lo: f64, hi: f64) {
        let lo = lo.max(self.bounds.0);
        let hi = hi.min(self.bounds.1);
        if lo <= hi {
            self.bounds = (lo, hi);
        }
    }

    /// Range width.
    pub fn width(&self) -> f64 {
        self.bounds.1 - self.bounds.0
    }

    /// Mutation standard deviation at round `iter`.
    pub fn sigma(&self, iter: usize) -> f64 {
        self.strength * self.width() * self.decay.powf(iter as f64)
    }
}

impl ConfigurationSpace for ScalarSpace {
    type Config = Scalar;

    fn sample(&self, rng: &mut SearchRng) -> Scalar {
        Scalar(rng.uniform(self.bounds))
    }

    fn element_type(&self) -> TypeTag {
        TypeTag::from(SCALAR_TAG)
    }
}

impl Operators for ScalarSpace {
    fn mutate(&self, config: &Scalar, iter: usize, rng: &mut SearchRng) -> Result<Scalar> {
        Ok(Scalar(rng.gaussian(config.0, self.sigma(iter), self.bounds)))
    }

    fn combine(&self, a: &Scalar, b: &Scalar, rng: &mut SearchRng) -> Result<Scalar> {
        let t = rng.r#gen::<f64>();
        Ok(Scalar(a.0 * (1.0 - t) + b.0 * t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_scalar_identity() {
        let mut set = HashSet::new();
        set.insert(Scalar(1.5));
        assert!(set.contains(&Scalar(1.5)));
        assert!(!set.contains(&Scalar(1.5000001)));
    }

    #[test]
    fn test_sample_and_mutate_in_bounds() {
        let space = ScalarSpace::new((0.0, 10.0)).with_strength(1.0);
        let mut rng = SearchRng::new(42);
        for iter in 1..20 {
            let x = space.sample(&mut rng);
            let y = space.mutate(&x, iter, &mut rng).unwrap();
            assert!((0.0..=10.0).contains(&x.0));
            assert!((0.0..=10.0).contains(&y.0));
        }
    }

    #[test]
    fn test_sigma_anneals() {
        let space = ScalarSpace::new((0.0, 10.0));
        assert!(space.sigma(1) > space.sigma(2));
        assert!((space.sigma(1) - 0.8).abs() < 1e-12);
        assert!(space.sigma(30) > 1e-3);
        assert!(space.sigma(50) < 1e-4);
    }

    #[test]
    fn test_mutate_inverted_bounds() {
        let space = ScalarSpace::new((10.0, 0.0));
        let mut rng = SearchRng::new(1);
        let child = space.mutate(&Scalar(5.0), 1, &mut rng).unwrap();
        assert_eq!(child, Scalar(10.0));
    }

    #[test]
    fn test_combine_between_parents() {
        let space = ScalarSpace::new((0.0, 10.0));
        let mut rng = SearchRng::new(3);
        let child = space.combine(&Scalar(2.0), &Scalar(4.0), &mut rng).unwrap();
        assert!((2.0..=4.0).contains(&child.0));
    }

    #[test]
    fn test_narrow() {
        let mut space = ScalarSpace::new((0.0, 10.0));
        space.narrow(2.0, 20.0);
        assert_eq!(space.bounds, (2.0, 10.0));
        space.narrow(11.0, 12.0);
        assert_eq!(space.bounds, (2.0, 10.0));
    }
}
