//! Reference configuration spaces.
//!
//! - `ScalarSpace`: one bounded real parameter with annealed Gaussian mutation
//! - `PolynomialSpace`: polynomials of a fixed degree, tagged by degree so that
//!   a `SpaceList` of several degrees searches structure and coefficients
//!   together

mod polynomial;
mod scalar;

pub use polynomial::{Polynomial, PolynomialSpace, polynomial_tag};
pub use scalar::{Scalar, ScalarSpace};
