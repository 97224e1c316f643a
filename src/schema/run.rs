//! Evaluation mode selection and CLI run configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{ParamsError, SearchParams};

/// Evaluation concurrency policy, selected once per run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EvaluationMode {
    /// Evaluate in submission order on the calling thread.
    #[default]
    Sequential,
    /// Evaluate on a rayon thread pool.
    ThreadParallel {
        /// Worker threads. `None` uses the available hardware threads.
        #[serde(default)]
        threads: Option<usize>,
    },
    /// Evaluate in separate worker processes.
    Distributed(WorkerPoolConfig),
}

/// How to launch worker processes for distributed evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
    /// Worker executable.
    pub program: PathBuf,
    /// Arguments passed to every worker.
    #[serde(default)]
    pub args: Vec<String>,
    /// Number of worker processes.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl WorkerPoolConfig {
    /// Create a config for `program` with the default worker count.
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            workers: default_workers(),
        }
    }

    /// Set worker arguments.
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the number of worker processes.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

/// Configuration of a scalar demo search run from the CLI.
///
/// Minimizes `(x - target)^2` over `x` in `bounds`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Search parameters.
    #[serde(default)]
    pub params: SearchParams,
    /// Evaluation mode.
    #[serde(default)]
    pub mode: EvaluationMode,
    /// Sampling range of the scalar space.
    #[serde(default = "default_bounds")]
    pub bounds: (f64, f64),
    /// Location of the minimum.
    #[serde(default = "default_target")]
    pub target: f64,
    /// Number of initial samples.
    #[serde(default = "default_initial")]
    pub initial: usize,
    /// Mutation strength as a fraction of the range width.
    #[serde(default = "default_strength")]
    pub strength: f64,
    /// Per-round decay of the mutation strength.
    #[serde(default = "default_decay")]
    pub decay: f64,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            params: SearchParams {
                max_population: 20,
                bsize: 5,
                mutbsize: 5,
                crossbsize: 0,
                max_iters: 50,
                tol: 1e-6,
                verbose: true,
            },
            mode: EvaluationMode::default(),
            bounds: default_bounds(),
            target: default_target(),
            initial: default_initial(),
            strength: default_strength(),
            decay: default_decay(),
            random_seed: Some(42),
        }
    }
}

fn default_bounds() -> (f64, f64) {
    (0.0, 10.0)
}
fn default_target() -> f64 {
    7.0
}
fn default_initial() -> usize {
    20
}
fn default_strength() -> f64 {
    0.1
}
fn default_decay() -> f64 {
    0.8
}

/// Run configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum RunConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse run config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid bounds: min ({0}) > max ({1})")]
    InvalidBounds(f64, f64),
    #[error("Decay must be in (0, 1], got {0}")]
    InvalidDecay(f64),
    #[error("Distributed mode needs at least one worker")]
    NoWorkers,
    #[error("Invalid search parameters: {0}")]
    Params(#[from] ParamsError),
}

impl RunConfig {
    /// Load and validate a run config from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RunConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| RunConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the run config.
    pub fn validate(&self) -> Result<(), RunConfigError> {
        self.params.validate()?;

        if self.bounds.0 > self.bounds.1 {
            return Err(RunConfigError::InvalidBounds(self.bounds.0, self.bounds.1));
        }
        if !(self.decay > 0.0 && self.decay <= 1.0) {
            return Err(RunConfigError::InvalidDecay(self.decay));
        }
        if let EvaluationMode::Distributed(pool) = &self.mode
            && pool.workers == 0
        {
            return Err(RunConfigError::NoWorkers);
        }

        Ok(())
    }
}
