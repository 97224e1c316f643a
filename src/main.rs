//! Shape search CLI - Run a scalar demo search or serve as a distributed worker.

use std::io;
use std::process;
use std::time::Instant;

use env_logger::Env;

use shape_search::{
    EvaluationMode, InitialPopulation, SearchEngine,
    schema::{RunConfig, WorkerPoolConfig},
    search::{EvaluationError, serve, strategy_for_mode},
    spaces::{Scalar, ScalarSpace},
};

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <run.json>", args[0]);
        eprintln!("       {} worker <target>", args[0]);
        eprintln!("       {} --example", args[0]);
        eprintln!();
        eprintln!("Minimize (x - target)^2 with an evolutionary search.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  run.json  Path to run configuration file");
        eprintln!("  worker    Serve evaluations on stdin/stdout for distributed mode");
        eprintln!("  --example Print example run configurations");
        eprintln!();
        eprintln!("Logs at info level by default; set RUST_LOG to change it.");
        process::exit(1);
    }

    match args[1].as_str() {
        "--example" => print_example_config(&args[0]),
        "worker" => run_worker(args.get(2)),
        path => run_search(path),
    }
}

fn objective(target: f64) -> impl Fn(&Scalar) -> Result<f64, EvaluationError> + Send + Sync {
    move |x: &Scalar| {
        if !x.0.is_finite() {
            return Err(EvaluationError::setup(format!("non-finite input {}", x.0)));
        }
        Ok((x.0 - target).powi(2))
    }
}

fn run_worker(target: Option<&String>) {
    let target: f64 = match target.map(|t| t.parse()) {
        Some(Ok(t)) => t,
        Some(Err(e)) => {
            eprintln!("Invalid target: {}", e);
            process::exit(1);
        }
        None => 7.0,
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(e) = serve(&objective(target), stdin.lock(), stdout.lock()) {
        eprintln!("Worker failed: {}", e);
        process::exit(1);
    }
}

fn run_search(path: &str) {
    let config = RunConfig::load(path).unwrap_or_else(|e| {
        eprintln!("Error loading run config: {}", e);
        process::exit(1);
    });

    println!("Shape Search");
    println!("============");
    println!("Objective: (x - {})^2", config.target);
    println!("Range: [{}, {}]", config.bounds.0, config.bounds.1);
    println!("Mode: {:?}", config.mode);
    println!(
        "Population: {} (breeding {}, mutation {}, crossover {})",
        config.params.max_population,
        config.params.bsize,
        config.params.mutbsize,
        config.params.crossbsize
    );
    println!();

    let mut strategy = strategy_for_mode::<Scalar, _>(&config.mode, objective(config.target))
        .unwrap_or_else(|e| {
            eprintln!("Error creating evaluator: {}", e);
            process::exit(1);
        });

    let space = ScalarSpace::new(config.bounds)
        .with_strength(config.strength)
        .with_decay(config.decay);
    let mut engine = SearchEngine::new(space, config.params.clone());
    if let Some(seed) = config.random_seed {
        engine = engine.with_seed(seed);
    }

    let start = Instant::now();
    let outcome = engine
        .run(&mut strategy, InitialPopulation::Sample(config.initial))
        .unwrap_or_else(|e| {
            eprintln!("Search failed: {}", e);
            process::exit(1);
        });
    let elapsed = start.elapsed();

    println!("Stopped: {:?}", outcome.stats.stop_reason);
    println!("  Rounds: {}", outcome.stats.iterations);
    println!(
        "  Evaluations: {} ({} failed)",
        outcome.stats.evaluations, outcome.stats.failures
    );
    println!("  Observed: {}", outcome.stats.observed);
    match outcome.best() {
        Some(best) => println!("  Best: x = {:.6}, error = {:.3e}", best.config.0, best.error),
        None => println!("  Best: none (every evaluation failed)"),
    }
    println!("Time: {:.3}s", elapsed.as_secs_f64());
}

fn print_example_config(program: &str) {
    let config = RunConfig::default();
    let distributed = RunConfig {
        mode: EvaluationMode::Distributed(
            WorkerPoolConfig::new(program)
                .with_args(["worker", "7"])
                .with_workers(4),
        ),
        ..RunConfig::default()
    };

    println!("Example configuration (run.json):");
    println!("{}", serde_json::to_string_pretty(&config).unwrap());
    println!();
    println!("Example distributed configuration:");
    println!("{}", serde_json::to_string_pretty(&distributed).unwrap());
}
