//! Distributed evaluation against real worker processes.
//!
//! Workers are the crate's own binary running `shape-search worker 7`.

use shape_search::{
    InitialPopulation, SearchEngine, SearchParams, SequentialEvaluator, StopReason, WorkerPool,
    schema::WorkerPoolConfig,
    search::{EvaluationError, EvaluationStrategy},
    spaces::{Scalar, ScalarSpace},
};

fn worker_config(workers: usize) -> WorkerPoolConfig {
    WorkerPoolConfig::new(env!("CARGO_BIN_EXE_shape-search"))
        .with_args(["worker", "7"])
        .with_workers(workers)
}

fn quadratic(x: &Scalar) -> Result<f64, EvaluationError> {
    Ok((x.0 - 7.0).powi(2))
}

fn params() -> SearchParams {
    SearchParams {
        max_population: 20,
        bsize: 5,
        mutbsize: 5,
        crossbsize: 2,
        max_iters: 15,
        tol: -1.0,
        ..Default::default()
    }
}

#[test]
fn test_distributed_matches_sequential() {
    let space = ScalarSpace::new((0.0, 10.0));

    let mut sequential = SequentialEvaluator::new(quadratic);
    let expected = SearchEngine::new(space.clone(), params())
        .with_seed(42)
        .run(&mut sequential, InitialPopulation::Sample(20))
        .unwrap();

    let mut pool = WorkerPool::<Scalar, f64>::spawn(&worker_config(3)).unwrap();
    let actual = SearchEngine::new(space, params())
        .with_seed(42)
        .run(&mut pool, InitialPopulation::Sample(20))
        .unwrap();

    assert_eq!(actual.stats.stop_reason, StopReason::MaxIterations);
    assert_eq!(actual.stats.iterations, expected.stats.iterations);
    assert_eq!(actual.stats.evaluations, expected.stats.evaluations);
    assert_eq!(actual.population, expected.population);
    assert_eq!(pool.live_workers(), 3);
}

#[test]
fn test_round_keeps_submission_order() {
    let mut pool = WorkerPool::<Scalar, f64>::spawn(&worker_config(2)).unwrap();
    let pending: Vec<Scalar> = (0..10).map(|i| Scalar(i as f64)).collect();

    let results = pool.evaluate(pending.clone()).unwrap();

    assert_eq!(results.len(), pending.len());
    for (result, config) in results.iter().zip(&pending) {
        assert_eq!(&result.config, config);
        assert_eq!(result.outcome, Ok((config.0 - 7.0).powi(2)));
    }
}

fn finite_quadratic(x: &Scalar) -> Result<f64, EvaluationError> {
    if !x.0.is_finite() {
        return Err(EvaluationError::setup(format!("non-finite input {}", x.0)));
    }
    quadratic(x)
}

fn seeds_with_non_finite() -> Vec<Scalar> {
    vec![
        Scalar(1.0),
        Scalar(2.0),
        Scalar(f64::INFINITY),
        Scalar(4.0),
        Scalar(5.0),
    ]
}

fn single_round() -> SearchParams {
    SearchParams {
        max_population: 10,
        bsize: 2,
        mutbsize: 0,
        crossbsize: 0,
        max_iters: 1,
        ..Default::default()
    }
}

#[test]
fn test_non_finite_config_is_contained() {
    // Non-finite floats serialize as `null`; the worker answers that job as
    // failed and keeps serving the rest of the round.
    let mut pool = WorkerPool::<Scalar, f64>::spawn(&worker_config(1)).unwrap();
    let results = pool
        .evaluate(vec![Scalar(f64::NAN), Scalar(3.0), Scalar(f64::INFINITY), Scalar(6.0)])
        .unwrap();

    assert!(matches!(results[0].outcome, Err(EvaluationError::Failed(_))));
    assert_eq!(results[1].outcome, Ok(16.0));
    assert!(matches!(results[2].outcome, Err(EvaluationError::Failed(_))));
    assert_eq!(results[3].outcome, Ok(1.0));
    assert_eq!(pool.live_workers(), 1);
}

#[test]
fn test_non_finite_seed_matches_sequential() {
    let space = ScalarSpace::new((0.0, 10.0));

    let mut sequential = SequentialEvaluator::new(finite_quadratic);
    let expected = SearchEngine::new(space.clone(), single_round())
        .run(&mut sequential, InitialPopulation::Seeds(seeds_with_non_finite()))
        .unwrap();

    let mut pool = WorkerPool::<Scalar, f64>::spawn(&worker_config(1)).unwrap();
    let actual = SearchEngine::new(space, single_round())
        .run(&mut pool, InitialPopulation::Seeds(seeds_with_non_finite()))
        .unwrap();

    assert_eq!(expected.population.len(), 4);
    assert_eq!(expected.stats.failures, 1);
    assert_eq!(actual.population, expected.population);
    assert_eq!(actual.stats.failures, expected.stats.failures);
    assert_eq!(actual.stats.observed, expected.stats.observed);
    assert_eq!(actual.best().unwrap().config, Scalar(5.0));
    assert_eq!(pool.live_workers(), 1);
}

#[test]
fn test_pool_without_live_workers_fails_jobs() {
    // An unparsable target makes every worker exit at startup.
    let config = WorkerPoolConfig::new(env!("CARGO_BIN_EXE_shape-search"))
        .with_args(["worker", "not-a-number"])
        .with_workers(1);
    let mut pool = WorkerPool::<Scalar, f64>::spawn(&config).unwrap();

    let first = pool.evaluate(vec![Scalar(1.0), Scalar(3.0)]).unwrap();
    assert!(matches!(first[0].outcome, Err(EvaluationError::Failed(_))));
    assert!(matches!(first[1].outcome, Err(EvaluationError::Failed(_))));
    assert_eq!(pool.live_workers(), 0);

    let second = pool.evaluate(vec![Scalar(6.0)]).unwrap();
    assert!(matches!(second[0].outcome, Err(EvaluationError::Failed(_))));
}
