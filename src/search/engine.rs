//! The search loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{Level, debug, error, info, log, warn};
use rand::seq::SliceRandom;

use crate::schema::{SearchHistory, SearchParams, SearchProgress, SearchStats, StopReason};

use super::error::{Result, SearchError};
use super::evaluation::{
    ErrorFunction, ErrorValue, Evaluated, EvaluationStrategy, SequentialEvaluator,
};
use super::hooks::{DefaultHooks, SearchHooks};
use super::population::{PendingQueue, Population, Scored};
use super::rng::SearchRng;
use super::space::{Configuration, ConfigurationSpace, Operators};

/// Where the first round's configurations come from.
#[derive(Debug, Clone)]
pub enum InitialPopulation<C> {
    /// Make this many sampling attempts from the space.
    Sample(usize),
    /// Use these configurations.
    Seeds(Vec<C>),
}

impl<C> From<usize> for InitialPopulation<C> {
    fn from(count: usize) -> Self {
        Self::Sample(count)
    }
}

impl<C> From<Vec<C>> for InitialPopulation<C> {
    fn from(seeds: Vec<C>) -> Self {
        Self::Seeds(seeds)
    }
}

/// Result of a finished search.
#[derive(Debug, Clone)]
pub struct SearchOutcome<C, O> {
    /// Final population, sorted ascending by error. May be empty.
    pub population: Vec<Scored<C, O>>,
    /// Run statistics.
    pub stats: SearchStats,
    /// Per-round history.
    pub history: SearchHistory,
}

impl<C, O> SearchOutcome<C, O> {
    /// Lowest-error configuration found.
    pub fn best(&self) -> Option<&Scored<C, O>> {
        self.population.first()
    }
}

/// Population-based evolutionary search over a configuration space.
pub struct SearchEngine<S, H = DefaultHooks> {
    space: S,
    params: SearchParams,
    hooks: H,
    rng: SearchRng,
    cancelled: Arc<AtomicBool>,
}

impl<S: Operators> SearchEngine<S, DefaultHooks> {
    /// Create an engine with default hooks and an entropy-seeded RNG.
    pub fn new(space: S, params: SearchParams) -> Self {
        Self {
            space,
            params,
            hooks: DefaultHooks,
            rng: SearchRng::random(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl<S: Operators, H> SearchEngine<S, H> {
    /// Replace the hooks.
    pub fn with_hooks<H2>(self, hooks: H2) -> SearchEngine<S, H2> {
        SearchEngine {
            space: self.space,
            params: self.params,
            hooks,
            rng: self.rng,
            cancelled: self.cancelled,
        }
    }

    /// Seed the RNG driving sampling, mutation and crossover.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SearchRng::new(seed);
        self
    }

    /// Get cancellation handle. Checked between rounds.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// The space, including any adaptation made by the hooks.
    pub fn space(&self) -> &S {
        &self.space
    }

    /// The parameters, including any adaptation made by the hooks.
    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// The hooks.
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Run to termination.
    pub fn run<E, O>(
        &mut self,
        strategy: &mut E,
        initial: InitialPopulation<S::Config>,
    ) -> Result<SearchOutcome<S::Config, O>>
    where
        E: EvaluationStrategy<S::Config, Output = O> + ?Sized,
        O: ErrorValue,
        H: SearchHooks<S, O>,
    {
        self.run_with_callback(strategy, initial, |_| {})
    }

    /// Run to termination, reporting progress after every round.
    pub fn run_with_callback<E, O, F>(
        &mut self,
        strategy: &mut E,
        initial: InitialPopulation<S::Config>,
        mut callback: F,
    ) -> Result<SearchOutcome<S::Config, O>>
    where
        E: EvaluationStrategy<S::Config, Output = O> + ?Sized,
        O: ErrorValue,
        H: SearchHooks<S, O>,
        F: FnMut(&SearchProgress),
    {
        self.params.validate()?;
        let start_time = Instant::now();

        let mut queue = PendingQueue::new();
        let mut population = Population::new();
        let mut history = SearchHistory::default();

        match initial {
            InitialPopulation::Sample(count) => {
                for _ in 0..count {
                    let config = self.space.sample(&mut self.rng);
                    self.enqueue::<O>(&mut queue, config);
                }
            }
            InitialPopulation::Seeds(seeds) => {
                for config in seeds {
                    self.enqueue::<O>(&mut queue, config);
                }
            }
        }

        info!(
            "Starting search: {} initial configurations, {} evaluation",
            queue.len(),
            strategy.name()
        );

        let mut iteration = 0;
        let mut previous_worst: Option<f64> = None;
        let mut evaluations = 0u64;
        let mut failures = 0u64;

        let stop_reason = loop {
            iteration += 1;

            let batch = queue.take();
            let queue_size = batch.len();
            let results = strategy.evaluate(batch)?;
            let round_failures = self.merge(results, &mut population);
            evaluations += queue_size as u64;
            failures += round_failures as u64;

            self.hooks
                .inspect_population(&mut self.space, &mut self.params, &population);

            population.sort();
            population.trim(self.params.max_population);

            let best_error = population.best().map(|s| s.error);
            let worst_error = population.worst().map(|s| s.error);
            history.best_error.push(best_error);
            history.worst_error.push(worst_error);
            history.population_size.push(population.len());
            history.queue_size.push(queue_size);

            let progress = SearchProgress {
                iteration,
                max_iters: self.params.max_iters,
                population_size: population.len(),
                queue_size,
                observed: queue.observed_len(),
                failures: round_failures,
                best_error,
                worst_error,
            };
            self.log_round(&progress);
            callback(&progress);

            if iteration >= self.params.max_iters {
                break StopReason::MaxIterations;
            }

            let Some(worst) = worst_error else {
                break StopReason::EmptyPopulation;
            };

            if let Some(previous) = previous_worst
                && self.hooks.converged(worst, previous, &self.params)
            {
                break StopReason::Converged;
            }
            previous_worst = Some(worst);

            if self.cancelled.load(Ordering::Relaxed) {
                break StopReason::Cancelled;
            }

            self.breed(&population, &mut queue, iteration)?;
        };

        let elapsed = start_time.elapsed().as_secs_f64();
        let stats = SearchStats {
            iterations: iteration,
            evaluations,
            failures,
            observed: queue.observed_len(),
            best_error: population.best().map(|s| s.error),
            elapsed_seconds: elapsed,
            stop_reason,
        };

        info!(
            "Search stopped after {} rounds ({:?}): {} evaluations, {} failures, best error {:?}",
            stats.iterations, stats.stop_reason, stats.evaluations, stats.failures, stats.best_error
        );

        Ok(SearchOutcome {
            population: population.into_vec(),
            stats,
            history,
        })
    }

    /// Enqueue through the accept hook and the observed set.
    fn enqueue<O>(&self, queue: &mut PendingQueue<S::Config>, config: S::Config) -> bool
    where
        O: ErrorValue,
        H: SearchHooks<S, O>,
    {
        self.hooks.accept_config(&config) && queue.offer(config)
    }

    /// Move successful evaluations into the population; returns the number
    /// of failures.
    fn merge<O>(
        &self,
        results: Vec<Evaluated<S::Config, O>>,
        population: &mut Population<S::Config, O>,
    ) -> usize
    where
        O: ErrorValue,
        H: SearchHooks<S, O>,
    {
        let mut failed = 0;
        for Evaluated { config, outcome } in results {
            match outcome {
                Ok(output) => {
                    let error = self.hooks.error_value(&output);
                    population.push(Scored {
                        config,
                        output,
                        error,
                    });
                }
                Err(e) => {
                    failed += 1;
                    if e.is_setup() {
                        warn!("Dropping configuration {:?}: {}", config, e);
                    } else {
                        error!("Error while evaluating {:?}: {}", config, e);
                    }
                }
            }
        }
        failed
    }

    /// Generate mutation and crossover offspring from the elite slice.
    fn breed<O>(
        &mut self,
        population: &Population<S::Config, O>,
        queue: &mut PendingQueue<S::Config>,
        iteration: usize,
    ) -> Result<()>
    where
        O: ErrorValue,
        H: SearchHooks<S, O>,
    {
        let elite = population.elite(self.params.bsize);
        if elite.is_empty() {
            return Ok(());
        }

        let mut offered = 0;
        for _ in 0..self.params.mutbsize {
            let parent = &elite[self.rng.index(elite.len())];
            let child = self.space.mutate(&parent.config, iteration, &mut self.rng)?;
            if self.enqueue::<O>(queue, child) {
                offered += 1;
            }
        }

        for _ in 0..self.params.crossbsize {
            let child = crossover(&self.space, elite, &mut self.rng)?;
            if self.enqueue::<O>(queue, child) {
                offered += 1;
            }
        }

        debug!(
            "Round {}: {} new offspring from an elite of {}",
            iteration,
            offered,
            elite.len()
        );
        Ok(())
    }

    fn log_round(&self, progress: &SearchProgress) {
        let level = if self.params.verbose {
            Level::Info
        } else {
            Level::Debug
        };
        log!(
            level,
            "Round {}/{}: population={} queue={} observed={} failures={} best={:?} worst={:?}",
            progress.iteration,
            progress.max_iters,
            progress.population_size,
            progress.queue_size,
            progress.observed,
            progress.failures,
            progress.best_error,
            progress.worst_error
        );
    }
}

/// One crossover offspring from an elite slice.
///
/// The slice is shuffled and a random member is swapped to the end to serve
/// as the anchor. The anchor is combined with the lowest-error remaining
/// member sharing its type tag, or returned unchanged if there is none.
/// An empty slice is [`SearchError::EmptyElite`].
pub fn crossover<S, O>(
    space: &S,
    elite: &[Scored<S::Config, O>],
    rng: &mut SearchRng,
) -> Result<S::Config>
where
    S: Operators,
{
    let Some(last) = elite.len().checked_sub(1) else {
        return Err(SearchError::EmptyElite);
    };
    let mut slice: Vec<&Scored<S::Config, O>> = elite.iter().collect();
    slice.shuffle(rng);
    let pos = rng.index(slice.len());
    slice.swap(pos, last);

    let anchor = slice[last];
    let tag = anchor.config.type_tag();
    let partner = slice[..last]
        .iter()
        .filter(|s| s.config.type_tag() == tag)
        .min_by(|a, b| a.error.total_cmp(&b.error));

    match partner {
        Some(partner) => space.combine(&anchor.config, &partner.config, rng),
        None => Ok(anchor.config.clone()),
    }
}

/// Sequential search with default hooks.
pub fn search<S, F>(
    error_fn: F,
    space: S,
    initial: InitialPopulation<S::Config>,
    params: SearchParams,
) -> Result<SearchOutcome<S::Config, F::Output>>
where
    S: Operators,
    F: ErrorFunction<S::Config>,
    F::Output: ErrorValue,
{
    let mut strategy = SequentialEvaluator::new(error_fn);
    SearchEngine::new(space, params).run(&mut strategy, initial)
}
