//! Error types for the search engine.

use serde::{Deserialize, Serialize};

use crate::schema::ParamsError;

use super::space::TypeTag;

/// Failure of a single configuration's evaluation.
///
/// Never fatal: the engine logs it and drops the configuration from the
/// round. The configuration stays in the observed set and is not retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum EvaluationError {
    /// The configuration is structurally invalid for this error function
    /// (incompatible dimensions, unsupported shape, ...).
    #[error("configuration setup failed: {0}")]
    Setup(String),
    /// Any other failure raised while computing the error.
    #[error("evaluation failed: {0}")]
    Failed(String),
}

impl EvaluationError {
    /// Construct a setup error.
    pub fn setup(msg: impl Into<String>) -> Self {
        Self::Setup(msg.into())
    }

    /// Construct an unexpected evaluation error.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Whether this is a configuration-setup error.
    pub fn is_setup(&self) -> bool {
        matches!(self, Self::Setup(_))
    }
}

/// Fatal search errors, propagated to the caller.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("no space in the list produces configurations of type {tag}")]
    Incompatible { tag: TypeTag },
    #[error("a space list needs at least one space")]
    EmptySpaceList,
    #[error("crossover needs a non-empty elite")]
    EmptyElite,
    #[error("invalid search parameters: {0}")]
    InvalidParams(#[from] ParamsError),
    #[error("failed to build evaluation thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("worker pool error: {0}")]
    Worker(String),
    #[error("worker I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for fatal search errors.
pub type Result<T> = std::result::Result<T, SearchError>;
