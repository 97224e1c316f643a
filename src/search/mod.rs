//! Evolutionary search engine for tuning model shape without gradients.
//!
//! # Overview
//!
//! The search system consists of:
//!
//! - **Spaces** (`space`): configuration, space and operator traits, plus
//!   `SpaceList` for heterogeneous searches
//! - **Bookkeeping** (`population`): the sorted, bounded population and the
//!   deduplicating pending queue
//! - **Evaluation** (`evaluation`, `distributed`): sequential, thread-parallel
//!   and worker-process strategies with per-configuration error containment
//! - **Search loop** (`engine`): initialization, evaluation, selection,
//!   termination and offspring generation
//!
//! # Example
//!
//! ```rust,no_run
//! use shape_search::schema::SearchParams;
//! use shape_search::search::{
//!     EvaluationError, InitialPopulation, SearchEngine, SequentialEvaluator,
//! };
//! use shape_search::spaces::{Scalar, ScalarSpace};
//!
//! let error = |x: &Scalar| -> Result<f64, EvaluationError> { Ok((x.0 - 7.0).powi(2)) };
//! let mut strategy = SequentialEvaluator::new(error);
//!
//! let mut engine = SearchEngine::new(ScalarSpace::new((0.0, 10.0)), SearchParams::default());
//! let outcome = engine
//!     .run(&mut strategy, InitialPopulation::Sample(20))
//!     .unwrap();
//!
//! if let Some(best) = outcome.best() {
//!     println!("best x = {:.4}, error = {:.2e}", best.config.0, best.error);
//! }
//! ```

mod distributed;
mod engine;
mod error;
mod evaluation;
mod hooks;
mod population;
mod rng;
mod space;

pub use distributed::{WorkRequest, WorkResponse, WorkerPool, serve};
pub use engine::{InitialPopulation, SearchEngine, SearchOutcome, crossover, search};
pub use error::{EvaluationError, Result, SearchError};
pub use evaluation::{
    ErrorFunction, ErrorValue, Evaluated, EvaluationStrategy, SequentialEvaluator,
    ThreadPoolEvaluator, evaluate_contained, strategy_for_mode,
};
pub use hooks::{DefaultHooks, SearchHooks};
pub use population::{PendingQueue, Population, Scored};
pub use rng::SearchRng;
pub use space::{Configuration, ConfigurationSpace, Operators, SpaceList, TypeTag};
