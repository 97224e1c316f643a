//! Shape search - derivative-free evolutionary tuning of model shape.
//!
//! This crate searches a user-defined configuration space for the
//! configuration minimizing a user-supplied error function, when no gradient
//! is available. Configurations are sampled, mutated, combined, scored and
//! deduplicated; everything else about them is up to the space author.
//!
//! # Architecture
//!
//! - `schema`: Parameters, reporting and run configuration types
//! - `search`: The search loop, bookkeeping and evaluation strategies
//! - `spaces`: Reference configuration spaces (scalars, polynomials)
//!
//! # Example
//!
//! ```rust,no_run
//! use shape_search::{InitialPopulation, SearchEngine, SearchParams, ThreadPoolEvaluator};
//! use shape_search::search::EvaluationError;
//! use shape_search::spaces::{Scalar, ScalarSpace};
//!
//! let params = SearchParams {
//!     max_population: 20,
//!     bsize: 5,
//!     mutbsize: 5,
//!     crossbsize: 0,
//!     max_iters: 50,
//!     ..Default::default()
//! };
//!
//! let error = |x: &Scalar| -> Result<f64, EvaluationError> { Ok((x.0 - 7.0).powi(2)) };
//! let mut strategy = ThreadPoolEvaluator::new(error).unwrap();
//!
//! let mut engine = SearchEngine::new(ScalarSpace::new((0.0, 10.0)), params).with_seed(42);
//! let outcome = engine
//!     .run(&mut strategy, InitialPopulation::Sample(20))
//!     .unwrap();
//!
//! println!("Stopped after {} rounds", outcome.stats.iterations);
//! ```

pub mod schema;
pub mod search;
pub mod spaces;

// Re-export commonly used types
pub use schema::{EvaluationMode, SearchParams, StopReason};
pub use search::{
    InitialPopulation, SearchEngine, SearchError, SearchOutcome, SequentialEvaluator,
    ThreadPoolEvaluator, WorkerPool,
};
