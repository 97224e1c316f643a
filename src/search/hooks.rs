//! Customization points of the search loop.

use crate::schema::SearchParams;

use super::evaluation::ErrorValue;
use super::population::Scored;
use super::space::ConfigurationSpace;

/// Hooks called by the engine at fixed points of every round.
///
/// Every method has a default, so implementors override only what they need.
pub trait SearchHooks<S: ConfigurationSpace, O: ErrorValue> {
    /// Veto gate applied before a configuration is enqueued. A rejected
    /// configuration is not marked as observed.
    fn accept_config(&self, _config: &S::Config) -> bool {
        true
    }

    /// Called once per round after evaluation and before sorting and
    /// trimming. The space and parameters may be adapted in place; nothing
    /// else touches them while this runs.
    fn inspect_population(
        &mut self,
        _space: &mut S,
        _params: &mut SearchParams,
        _population: &[Scored<S::Config, O>],
    ) {
    }

    /// Whether the run has converged, given the worst retained error of this
    /// round and of the previous one.
    fn converged(&self, current_worst: f64, previous_worst: f64, params: &SearchParams) -> bool {
        params.early_stopping() && (current_worst - previous_worst).abs() <= params.tol
    }

    /// Scalar error of a raw evaluation output.
    fn error_value(&self, output: &O) -> f64 {
        output.error_value()
    }
}

/// Accept everything, never adapt, converge on `tol`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl<S: ConfigurationSpace, O: ErrorValue> SearchHooks<S, O> for DefaultHooks {}
