//! Evaluation strategies: sequential, thread-parallel and distributed.
//!
//! Every strategy takes the whole pending queue of a round and returns one
//! [`Evaluated`] per configuration once all of them are done. The engine
//! merges the successes into the population; failures are contained per
//! configuration and never abort the round.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::schema::EvaluationMode;

use super::distributed::WorkerPool;
use super::error::{EvaluationError, Result};

/// Extracts the scalar cost from an error function's raw output.
pub trait ErrorValue {
    /// Scalar error. Lower is better.
    fn error_value(&self) -> f64;
}

impl ErrorValue for f64 {
    fn error_value(&self) -> f64 {
        *self
    }
}

impl ErrorValue for f32 {
    fn error_value(&self) -> f64 {
        f64::from(*self)
    }
}

/// User-supplied objective.
///
/// Implemented for every `Fn(&C) -> Result<O, EvaluationError>`.
pub trait ErrorFunction<C>: Send + Sync {
    /// Raw evaluation output.
    type Output: Send;

    /// Evaluate one configuration.
    fn evaluate(&self, config: &C) -> std::result::Result<Self::Output, EvaluationError>;
}

impl<C, O, F> ErrorFunction<C> for F
where
    F: Fn(&C) -> std::result::Result<O, EvaluationError> + Send + Sync,
    O: Send,
{
    type Output = O;

    fn evaluate(&self, config: &C) -> std::result::Result<O, EvaluationError> {
        self(config)
    }
}

/// Outcome of evaluating one pending configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluated<C, O> {
    /// The evaluated configuration.
    pub config: C,
    /// Raw output, or the contained failure.
    pub outcome: std::result::Result<O, EvaluationError>,
}

/// Evaluation concurrency policy.
pub trait EvaluationStrategy<C> {
    /// Raw output of the underlying error function.
    type Output;

    /// Evaluate every pending configuration and wait for all of them.
    fn evaluate(&mut self, pending: Vec<C>) -> Result<Vec<Evaluated<C, Self::Output>>>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

impl<C, S> EvaluationStrategy<C> for Box<S>
where
    S: EvaluationStrategy<C> + ?Sized,
{
    type Output = S::Output;

    fn evaluate(&mut self, pending: Vec<C>) -> Result<Vec<Evaluated<C, Self::Output>>> {
        (**self).evaluate(pending)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Run the error function, turning a panic into [`EvaluationError::Failed`].
pub fn evaluate_contained<C, F>(
    error_fn: &F,
    config: &C,
) -> std::result::Result<F::Output, EvaluationError>
where
    F: ErrorFunction<C> + ?Sized,
{
    panic::catch_unwind(AssertUnwindSafe(|| error_fn.evaluate(config)))
        .unwrap_or_else(|payload| Err(EvaluationError::Failed(panic_message(payload))))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}

/// Evaluates in submission order on the calling thread.
pub struct SequentialEvaluator<F> {
    error_fn: F,
}

impl<F> SequentialEvaluator<F> {
    /// Create a sequential evaluator.
    pub fn new(error_fn: F) -> Self {
        Self { error_fn }
    }
}

impl<C, F: ErrorFunction<C>> EvaluationStrategy<C> for SequentialEvaluator<F> {
    type Output = F::Output;

    fn evaluate(&mut self, pending: Vec<C>) -> Result<Vec<Evaluated<C, F::Output>>> {
        Ok(pending
            .into_iter()
            .map(|config| {
                let outcome = evaluate_contained(&self.error_fn, &config);
                Evaluated { config, outcome }
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "sequential"
    }
}

/// Evaluates every configuration as an independent task on a rayon pool.
pub struct ThreadPoolEvaluator<F> {
    error_fn: F,
    pool: rayon::ThreadPool,
}

impl<F> ThreadPoolEvaluator<F> {
    /// Pool sized to the available hardware threads.
    pub fn new(error_fn: F) -> Result<Self> {
        Self::with_threads(error_fn, None)
    }

    /// Pool with an explicit thread count. `None` or `Some(0)` uses the
    /// available hardware threads.
    pub fn with_threads(error_fn: F, threads: Option<usize>) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.unwrap_or(0))
            .thread_name(|i| format!("shape-search-eval-{i}"))
            .build()?;
        Ok(Self { error_fn, pool })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl<C, F> EvaluationStrategy<C> for ThreadPoolEvaluator<F>
where
    C: Send + Sync,
    F: ErrorFunction<C>,
{
    type Output = F::Output;

    fn evaluate(&mut self, pending: Vec<C>) -> Result<Vec<Evaluated<C, F::Output>>> {
        let error_fn = &self.error_fn;
        Ok(self.pool.install(|| {
            pending
                .into_par_iter()
                .map(|config| {
                    let outcome = evaluate_contained(error_fn, &config);
                    Evaluated { config, outcome }
                })
                .collect()
        }))
    }

    fn name(&self) -> &'static str {
        "thread-parallel"
    }
}

/// Build the strategy selected by `mode`.
///
/// In distributed mode `error_fn` is unused: the worker processes carry
/// their own copy of the objective.
pub fn strategy_for_mode<C, F>(
    mode: &EvaluationMode,
    error_fn: F,
) -> Result<Box<dyn EvaluationStrategy<C, Output = F::Output>>>
where
    C: Serialize + DeserializeOwned + Send + Sync + 'static,
    F: ErrorFunction<C> + 'static,
    F::Output: DeserializeOwned + 'static,
{
    Ok(match mode {
        EvaluationMode::Sequential => Box::new(SequentialEvaluator::new(error_fn)),
        EvaluationMode::ThreadParallel { threads } => {
            Box::new(ThreadPoolEvaluator::with_threads(error_fn, *threads)?)
        }
        EvaluationMode::Distributed(config) => Box::new(WorkerPool::spawn(config)?),
    })
}
