//! Fixed-degree polynomial spaces.

use std::hash::{Hash, Hasher};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::search::{
    Configuration, ConfigurationSpace, Operators, Result, SearchError, SearchRng, TypeTag,
};

/// Type tag of degree-`degree` polynomials.
pub fn polynomial_tag(degree: usize) -> TypeTag {
    TypeTag::new(format!("poly{degree}"))
}

/// Polynomial with coefficients in ascending power order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polynomial {
    /// `coefficients[i]` multiplies `x^i`.
    pub coefficients: Vec<f64>,
}

impl Polynomial {
    /// Create from coefficients in ascending power order.
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    /// Degree (number of coefficients minus one).
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Evaluate at `x` (Horner's scheme).
    pub fn eval(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * x + c)
    }
}

impl PartialEq for Polynomial {
    fn eq(&self, other: &Self) -> bool {
        self.coefficients.len() == other.coefficients.len()
            && self
                .coefficients
                .iter()
                .zip(&other.coefficients)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Eq for Polynomial {}

impl Hash for Polynomial {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.coefficients.len().hash(state);
        for c in &self.coefficients {
            c.to_bits().hash(state);
        }
    }
}

impl Configuration for Polynomial {
    fn type_tag(&self) -> TypeTag {
        polynomial_tag(self.degree())
    }
}

/// Degree-`degree` polynomials with bounded coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialSpace {
    /// Polynomial degree.
    pub degree: usize,
    /// Range of every coefficient.
    pub coefficient_bounds: (f64, f64),
    /// Mutation standard deviation at round 1, as a fraction of the range
    /// width. Shrinks as `1 / iter`.
    pub strength: f64,
}

impl PolynomialSpace {
    /// Create a space of degree-`degree` polynomials.
    pub fn new(degree: usize, coefficient_bounds: (f64, f64)) -> Self {
        Self {
            degree,
            coefficient_bounds,
            strength: 0.1,
        }
    }

    /// One space per degree in `degrees`, in order.
    pub fn degrees(
        degrees: impl IntoIterator<Item = usize>,
        coefficient_bounds: (f64, f64),
    ) -> Vec<Self> {
        degrees
            .into_iter()
            .map(|d| Self::new(d, coefficient_bounds))
            .collect()
    }

    fn check(&self, config: &Polynomial) -> Result<()> {
        if config.coefficients.len() != self.degree + 1 {
            return Err(SearchError::Incompatible {
                tag: config.type_tag(),
            });
        }
        Ok(())
    }
}

impl ConfigurationSpace for PolynomialSpace {
    type Config = Polynomial;

    fn sample(&self, rng: &mut SearchRng) -> Polynomial {
        Polynomial::new(
            (0..=self.degree)
                .map(|_| rng.uniform(self.coefficient_bounds))
                .collect(),
        )
    }

    fn element_type(&self) -> TypeTag {
        polynomial_tag(self.degree)
    }
}

impl Operators for PolynomialSpace {
    fn mutate(&self, config: &Polynomial, iter: usize, rng: &mut SearchRng) -> Result<Polynomial> {
        self.check(config)?;
        let width = self.coefficient_bounds.1 - self.coefficient_bounds.0;
        let sigma = self.strength * width / iter.max(1) as f64;
        Ok(Polynomial::new(
            config
                .coefficients
                .iter()
                .map(|&c| rng.gaussian(c, sigma, self.coefficient_bounds))
                .collect(),
        ))
    }

    fn combine(&self, a: &Polynomial, b: &Polynomial, rng: &mut SearchRng) -> Result<Polynomial> {
        self.check(a)?;
        self.check(b)?;
        Ok(Polynomial::new(
            a.coefficients
                .iter()
                .zip(&b.coefficients)
                .map(|(&x, &y)| {
                    let t = rng.r#gen::<f64>();
                    x * (1.0 - t) + y * t
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SpaceList;

    #[test]
    fn test_eval() {
        // 1 + 2x + 3x^2
        let p = Polynomial::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(p.degree(), 2);
        assert_eq!(p.eval(0.0), 1.0);
        assert_eq!(p.eval(2.0), 17.0);
        assert_eq!(p.type_tag(), polynomial_tag(2));
    }

    #[test]
    fn test_sample_has_degree() {
        let space = PolynomialSpace::new(3, (-1.0, 1.0));
        let mut rng = SearchRng::new(5);
        let p = space.sample(&mut rng);
        assert_eq!(p.coefficients.len(), 4);
        assert!(p.coefficients.iter().all(|c| (-1.0..=1.0).contains(c)));
    }

    #[test]
    fn test_combine_rejects_mixed_degrees() {
        let space = PolynomialSpace::new(1, (-1.0, 1.0));
        let mut rng = SearchRng::new(5);
        let a = Polynomial::new(vec![0.0, 1.0]);
        let b = Polynomial::new(vec![0.0, 1.0, 2.0]);
        assert!(matches!(
            space.combine(&a, &b, &mut rng),
            Err(SearchError::Incompatible { .. })
        ));
    }

    #[test]
    fn test_list_dispatches_by_degree() {
        let spaces = SpaceList::new(PolynomialSpace::degrees(1..=3, (-1.0, 1.0))).unwrap();
        let mut rng = SearchRng::new(9);
        let p = Polynomial::new(vec![0.5, 0.5, 0.5]);
        let child = spaces.mutate(&p, 1, &mut rng).unwrap();
        assert_eq!(child.degree(), 2);

        let q = Polynomial::new(vec![0.0; 6]);
        assert!(matches!(
            spaces.mutate(&q, 1, &mut rng),
            Err(SearchError::Incompatible { .. })
        ));
    }
}
