//! Population, pending queue and observed-set bookkeeping.

use std::collections::HashSet;
use std::hash::Hash;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// A configuration together with its evaluation output and scalar error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scored<C, O> {
    /// The configuration.
    pub config: C,
    /// Raw output of the error function.
    pub output: O,
    /// Scalar cost extracted from `output`. Lower is better.
    pub error: f64,
}

/// Scored configurations, kept sorted ascending by error between rounds.
#[derive(Debug, Clone)]
pub struct Population<C, O> {
    members: Vec<Scored<C, O>>,
}

impl<C, O> Default for Population<C, O> {
    fn default() -> Self {
        Self {
            members: Vec::new(),
        }
    }
}

impl<C, O> Population<C, O> {
    /// Create an empty population.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scored configuration. Order is restored by [`Self::sort`].
    pub fn push(&mut self, scored: Scored<C, O>) {
        self.members.push(scored);
    }

    /// Stable ascending sort by error; ties keep arrival order.
    pub fn sort(&mut self) {
        self.members.sort_by(|a, b| a.error.total_cmp(&b.error));
    }

    /// Drop the worst entries beyond `max`. Assumes the population is sorted.
    pub fn trim(&mut self, max: usize) {
        self.members.truncate(max);
    }

    /// Best `bsize` members (fewer if the population is smaller).
    pub fn elite(&self, bsize: usize) -> &[Scored<C, O>] {
        &self.members[..bsize.min(self.members.len())]
    }

    /// Lowest-error member.
    pub fn best(&self) -> Option<&Scored<C, O>> {
        self.members.first()
    }

    /// Highest-error retained member.
    pub fn worst(&self) -> Option<&Scored<C, O>> {
        self.members.last()
    }

    /// Whether the members are sorted ascending by error.
    pub fn is_sorted(&self) -> bool {
        self.members
            .windows(2)
            .all(|w| w[0].error.total_cmp(&w[1].error).is_le())
    }

    /// Consume into the member vector, best first.
    pub fn into_vec(self) -> Vec<Scored<C, O>> {
        self.members
    }
}

impl<C, O> Deref for Population<C, O> {
    type Target = [Scored<C, O>];

    fn deref(&self) -> &Self::Target {
        &self.members
    }
}

/// Configurations awaiting evaluation, guarded by the run's observed set.
#[derive(Debug, Clone)]
pub struct PendingQueue<C> {
    pending: Vec<C>,
    observed: HashSet<C>,
}

impl<C> Default for PendingQueue<C> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            observed: HashSet::new(),
        }
    }
}

impl<C: Clone + Eq + Hash> PendingQueue<C> {
    /// Create an empty queue with an empty observed set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `config` unless it was observed before.
    ///
    /// Returns whether it was enqueued. An enqueued configuration stays
    /// observed for the rest of the run.
    pub fn offer(&mut self, config: C) -> bool {
        if self.observed.contains(&config) {
            return false;
        }
        self.observed.insert(config.clone());
        self.pending.push(config);
        true
    }

    /// Drain the queue in insertion order.
    pub fn take(&mut self) -> Vec<C> {
        std::mem::take(&mut self.pending)
    }

    /// Whether `config` was ever enqueued.
    pub fn is_observed(&self, config: &C) -> bool {
        self.observed.contains(config)
    }

    /// Configurations currently pending.
    pub fn pending(&self) -> &[C] {
        &self.pending
    }

    /// Number of pending configurations.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of configurations ever enqueued.
    pub fn observed_len(&self) -> usize {
        self.observed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scored(config: u32, error: f64) -> Scored<u32, f64> {
        Scored {
            config,
            output: error,
            error,
        }
    }

    #[test]
    fn test_sort_is_stable() {
        let mut population = Population::new();
        population.push(scored(1, 2.0));
        population.push(scored(2, 1.0));
        population.push(scored(3, 2.0));
        population.sort();

        let order: Vec<u32> = population.iter().map(|s| s.config).collect();
        assert_eq!(order, vec![2, 1, 3]);
        assert_eq!(population.best().unwrap().config, 2);
        assert_eq!(population.worst().unwrap().config, 3);
    }

    #[test]
    fn test_elite_clamped_to_size() {
        let mut population = Population::new();
        population.push(scored(1, 0.0));
        population.push(scored(2, 1.0));
        assert_eq!(population.elite(5).len(), 2);
        assert_eq!(population.elite(1).len(), 1);
        assert!(population.elite(0).is_empty());
    }

    #[test]
    fn test_queue_rejects_observed() {
        let mut queue = PendingQueue::new();
        assert!(queue.offer(1));
        assert!(queue.offer(2));
        assert!(!queue.offer(1));
        assert_eq!(queue.take(), vec![1, 2]);
        assert!(queue.is_empty());

        // Still observed after draining.
        assert!(!queue.offer(2));
        assert!(queue.is_observed(&1));
        assert_eq!(queue.observed_len(), 2);
    }

    proptest! {
        #[test]
        fn prop_sort_and_trim(
            errors in prop::collection::vec(-1e6f64..1e6, 0..200),
            max in 1usize..50,
        ) {
            let mut population = Population::new();
            for (i, e) in errors.iter().enumerate() {
                population.push(scored(i as u32, *e));
            }
            population.sort();
            population.trim(max);

            prop_assert!(population.len() <= max);
            prop_assert!(population.is_sorted());
            if let Some(best) = population.best() {
                let min = errors.iter().copied().fold(f64::INFINITY, f64::min);
                prop_assert_eq!(best.error, min);
            }
        }

        #[test]
        fn prop_queue_is_distinct(values in prop::collection::vec(0u8..20, 0..100)) {
            let mut queue = PendingQueue::new();
            for v in &values {
                queue.offer(*v);
            }
            let taken = queue.take();
            let distinct: HashSet<u8> = values.iter().copied().collect();
            prop_assert_eq!(taken.len(), distinct.len());
            prop_assert_eq!(queue.observed_len(), distinct.len());
        }
    }
}
