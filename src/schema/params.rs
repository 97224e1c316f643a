//! Search parameters and run reporting types.

use serde::{Deserialize, Serialize};

/// Parameters controlling one search run.
///
/// The engine owns its copy for the duration of a run. The only place it can
/// change is the `inspect_population` hook, which receives `&mut SearchParams`
/// between evaluation and offspring generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Maximum number of scored configurations kept after each round.
    #[serde(default = "default_max_population")]
    pub max_population: usize,
    /// Size of the elite slice used as breeding stock.
    #[serde(default = "default_bsize")]
    pub bsize: usize,
    /// Offspring produced by mutation per round.
    #[serde(default = "default_mutbsize")]
    pub mutbsize: usize,
    /// Offspring produced by crossover per round.
    #[serde(default = "default_crossbsize")]
    pub crossbsize: usize,
    /// Maximum number of rounds.
    #[serde(default = "default_max_iters")]
    pub max_iters: usize,
    /// Convergence tolerance on the worst retained error.
    /// A negative value disables early stopping.
    #[serde(default = "default_tol")]
    pub tol: f64,
    /// Log round summaries at `info` level instead of `debug`.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            max_population: default_max_population(),
            bsize: default_bsize(),
            mutbsize: default_mutbsize(),
            crossbsize: default_crossbsize(),
            max_iters: default_max_iters(),
            tol: default_tol(),
            verbose: false,
        }
    }
}

fn default_max_population() -> usize {
    100
}
fn default_bsize() -> usize {
    10
}
fn default_mutbsize() -> usize {
    20
}
fn default_crossbsize() -> usize {
    20
}
fn default_max_iters() -> usize {
    100
}
fn default_tol() -> f64 {
    1e-6
}

/// Search parameter validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("Maximum population must be at least 1")]
    PopulationTooSmall,
    #[error("Maximum iterations must be at least 1")]
    NoIterations,
    #[error("Convergence tolerance must not be NaN")]
    InvalidTolerance,
}

impl SearchParams {
    /// Validate search parameters.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.max_population == 0 {
            return Err(ParamsError::PopulationTooSmall);
        }
        if self.max_iters == 0 {
            return Err(ParamsError::NoIterations);
        }
        if self.tol.is_nan() {
            return Err(ParamsError::InvalidTolerance);
        }
        Ok(())
    }

    /// Whether early stopping on convergence is enabled.
    pub fn early_stopping(&self) -> bool {
        self.tol >= 0.0
    }
}

/// Reason a search stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Reached the maximum number of rounds.
    MaxIterations,
    /// The worst retained error stopped moving.
    Converged,
    /// Every configuration failed evaluation (or none were queued).
    EmptyPopulation,
    /// User cancelled between rounds.
    Cancelled,
}

/// Per-round statistics history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchHistory {
    /// Best retained error per round (`None` for an empty population).
    pub best_error: Vec<Option<f64>>,
    /// Worst retained error per round.
    pub worst_error: Vec<Option<f64>>,
    /// Population size after trimming, per round.
    pub population_size: Vec<usize>,
    /// Number of configurations evaluated, per round.
    pub queue_size: Vec<usize>,
}

impl SearchHistory {
    /// Number of recorded rounds.
    pub fn rounds(&self) -> usize {
        self.population_size.len()
    }
}

/// Snapshot reported to progress callbacks after every round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchProgress {
    /// Completed round (1-based).
    pub iteration: usize,
    /// Configured maximum number of rounds.
    pub max_iters: usize,
    /// Population size after trimming.
    pub population_size: usize,
    /// Configurations evaluated this round.
    pub queue_size: usize,
    /// Configurations observed so far.
    pub observed: usize,
    /// Configurations that failed evaluation this round.
    pub failures: usize,
    /// Best retained error, if any.
    pub best_error: Option<f64>,
    /// Worst retained error, if any.
    pub worst_error: Option<f64>,
}

/// Summary statistics of a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchStats {
    /// Rounds completed.
    pub iterations: usize,
    /// Total evaluations attempted.
    pub evaluations: u64,
    /// Total evaluations that failed.
    pub failures: u64,
    /// Size of the observed set at the end of the run.
    pub observed: usize,
    /// Best error in the final population.
    pub best_error: Option<f64>,
    /// Wall-clock time of the run.
    pub elapsed_seconds: f64,
    /// Why the run stopped.
    pub stop_reason: StopReason,
}
