//! Distributed evaluation over a pool of worker processes.
//!
//! Workers speak a line-delimited JSON protocol on stdin/stdout: one
//! [`WorkRequest`] line in, one [`WorkResponse`] line out. The worker side is
//! implemented by [`serve`]; the CLI's `worker` command is a ready-made
//! worker for the scalar demo objective.

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Mutex, PoisonError};
use std::thread;

use log::{debug, error, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::schema::WorkerPoolConfig;

use super::error::{EvaluationError, Result, SearchError};
use super::evaluation::{ErrorFunction, Evaluated, EvaluationStrategy, evaluate_contained};

/// Request line sent to a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkRequest<C> {
    /// Job identifier, echoed in the response.
    pub id: u64,
    /// Configuration to evaluate.
    pub config: C,
}

/// Response line written by a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkResponse<O> {
    /// Identifier of the request being answered.
    pub id: u64,
    /// Raw output, or the failure raised by the error function.
    pub outcome: std::result::Result<O, EvaluationError>,
}

/// Serve evaluation requests until `reader` is exhausted.
///
/// Blank lines are skipped. A request whose configuration cannot be decoded
/// is answered with [`EvaluationError::Failed`]. A line that is not a
/// request at all ends the loop with an `InvalidData` error.
pub fn serve<C, F, R, W>(error_fn: &F, reader: R, mut writer: W) -> io::Result<()>
where
    C: DeserializeOwned,
    F: ErrorFunction<C> + ?Sized,
    F::Output: Serialize,
    R: BufRead,
    W: Write,
{
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        // Only a broken envelope ends the worker. A config that does not
        // decode (non-finite floats arrive as `null`) is answered as failed.
        let request: WorkRequest<serde_json::Value> = serde_json::from_str(&line)?;
        let outcome = match serde_json::from_value::<C>(request.config) {
            Ok(config) => evaluate_contained(error_fn, &config),
            Err(e) => Err(EvaluationError::failed(format!("undecodable configuration: {e}"))),
        };
        let response = WorkResponse {
            id: request.id,
            outcome,
        };

        serde_json::to_writer(&mut writer, &response)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    Ok(())
}

/// One worker process and its pipes.
struct Worker {
    index: usize,
    child: Child,
    stdin: Option<BufWriter<ChildStdin>>,
    stdout: BufReader<ChildStdout>,
    alive: bool,
}

impl Worker {
    fn spawn(index: usize, program: &Path, args: &[String]) -> Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SearchError::Worker(format!("worker {index} has no stdin")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SearchError::Worker(format!("worker {index} has no stdout")))?;

        Ok(Self {
            index,
            child,
            stdin: Some(BufWriter::new(stdin)),
            stdout: BufReader::new(stdout),
            alive: true,
        })
    }

    /// Send one request and wait for its response.
    fn request<C, O>(
        &mut self,
        id: u64,
        config: &C,
    ) -> io::Result<std::result::Result<O, EvaluationError>>
    where
        C: Serialize,
        O: DeserializeOwned,
    {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "stdin closed"))?;
        serde_json::to_writer(&mut *stdin, &WorkRequest { id, config })?;
        stdin.write_all(b"\n")?;
        stdin.flush()?;

        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "worker closed its output",
            ));
        }

        let response: WorkResponse<O> = serde_json::from_str(&line)?;
        if response.id != id {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("expected response {id}, got {}", response.id),
            ));
        }
        Ok(response.outcome)
    }

    /// Pull jobs until the queue is empty or this worker fails.
    fn drain<C, O>(
        &mut self,
        pending: &[C],
        jobs: &Mutex<VecDeque<usize>>,
    ) -> Vec<(usize, std::result::Result<O, EvaluationError>)>
    where
        C: Serialize,
        O: DeserializeOwned,
    {
        let mut done = Vec::new();
        loop {
            let next = jobs
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();
            let Some(idx) = next else {
                break;
            };

            match self.request(idx as u64, &pending[idx]) {
                Ok(outcome) => done.push((idx, outcome)),
                Err(e) => {
                    error!("Worker {} retired: {}", self.index, e);
                    self.alive = false;
                    self.stdin = None;
                    done.push((
                        idx,
                        Err(EvaluationError::Failed(format!(
                            "worker {} failed: {e}",
                            self.index
                        ))),
                    ));
                    break;
                }
            }
        }
        done
    }
}

/// Evaluation strategy dispatching to separate worker processes.
///
/// Each live worker is driven by its own I/O thread pulling from a shared job
/// queue; the round returns only once every job has an outcome.
pub struct WorkerPool<C, O> {
    workers: Vec<Worker>,
    _marker: PhantomData<fn(C) -> O>,
}

impl<C, O> WorkerPool<C, O> {
    /// Launch `config.workers` worker processes.
    pub fn spawn(config: &WorkerPoolConfig) -> Result<Self> {
        if config.workers == 0 {
            return Err(SearchError::Worker(
                "worker pool needs at least one worker".to_string(),
            ));
        }

        let workers = (0..config.workers)
            .map(|i| Worker::spawn(i, &config.program, &config.args))
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Spawned {} workers running {}",
            workers.len(),
            config.program.display()
        );

        Ok(Self {
            workers,
            _marker: PhantomData,
        })
    }

    /// Number of workers still accepting jobs.
    pub fn live_workers(&self) -> usize {
        self.workers.iter().filter(|w| w.alive).count()
    }
}

impl<C, O> EvaluationStrategy<C> for WorkerPool<C, O>
where
    C: Serialize + Sync,
    O: DeserializeOwned + Send,
{
    type Output = O;

    fn evaluate(&mut self, pending: Vec<C>) -> Result<Vec<Evaluated<C, O>>> {
        let jobs = Mutex::new((0..pending.len()).collect::<VecDeque<_>>());
        let mut outcomes: Vec<Option<std::result::Result<O, EvaluationError>>> =
            (0..pending.len()).map(|_| None).collect();

        let finished = thread::scope(|scope| {
            let handles: Vec<_> = self
                .workers
                .iter_mut()
                .filter(|w| w.alive)
                .map(|worker| {
                    let pending = &pending;
                    let jobs = &jobs;
                    scope.spawn(move || worker.drain::<C, O>(pending, jobs))
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .map_err(|_| SearchError::Worker("worker I/O thread panicked".to_string()))
                })
                .collect::<Result<Vec<_>>>()
        })?;

        for (idx, outcome) in finished.into_iter().flatten() {
            outcomes[idx] = Some(outcome);
        }

        debug!(
            "Distributed round: {} jobs, {} live workers",
            pending.len(),
            self.live_workers()
        );

        Ok(pending
            .into_iter()
            .zip(outcomes)
            .map(|(config, outcome)| Evaluated {
                config,
                outcome: outcome.unwrap_or_else(|| {
                    Err(EvaluationError::Failed("no live workers".to_string()))
                }),
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "distributed"
    }
}

impl<C, O> Drop for WorkerPool<C, O> {
    fn drop(&mut self) {
        for worker in &mut self.workers {
            // Closing stdin ends the worker's serve loop.
            worker.stdin = None;
            if !worker.alive {
                let _ = worker.child.kill();
            }
            if let Err(e) = worker.child.wait() {
                error!("Failed to reap worker {}: {}", worker.index, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn offset_error(x: &f64) -> std::result::Result<f64, EvaluationError> {
        if *x < 0.0 {
            Err(EvaluationError::setup("negative"))
        } else {
            Ok((x - 7.0).powi(2))
        }
    }

    #[test]
    fn test_serve_answers_each_request() {
        let input = concat!(
            "{\"id\":0,\"config\":7.0}\n",
            "\n",
            "{\"id\":1,\"config\":-1.0}\n",
            "{\"id\":2,\"config\":9.0}\n",
        );
        let mut output = Vec::new();
        serve(&offset_error, Cursor::new(input), &mut output).unwrap();

        let responses: Vec<WorkResponse<f64>> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0].id, 0);
        assert_eq!(responses[0].outcome, Ok(0.0));
        assert_eq!(
            responses[1].outcome,
            Err(EvaluationError::Setup("negative".to_string()))
        );
        assert_eq!(responses[2].outcome, Ok(4.0));
    }

    #[test]
    fn test_serve_survives_undecodable_config() {
        let input = concat!(
            "{\"id\":0,\"config\":null}\n",
            "{\"id\":1,\"config\":\"seven\"}\n",
            "{\"id\":2,\"config\":8.0}\n",
        );
        let mut output = Vec::new();
        serve(&offset_error, Cursor::new(input), &mut output).unwrap();

        let responses: Vec<WorkResponse<f64>> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0].id, 0);
        assert!(matches!(responses[0].outcome, Err(EvaluationError::Failed(_))));
        assert_eq!(responses[1].id, 1);
        assert!(matches!(responses[1].outcome, Err(EvaluationError::Failed(_))));
        assert_eq!(responses[2].id, 2);
        assert_eq!(responses[2].outcome, Ok(1.0));
    }

    #[test]
    fn test_serve_rejects_malformed_request() {
        let mut output = Vec::new();
        let result = serve(&offset_error, Cursor::new("not json\n"), &mut output);
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_spawn_missing_program() {
        let config = WorkerPoolConfig::new("/nonexistent/shape-search-worker").with_workers(1);
        let result = WorkerPool::<f64, f64>::spawn(&config);
        assert!(matches!(result, Err(SearchError::Io(_))));
    }

    #[test]
    fn test_spawn_requires_workers() {
        let config = WorkerPoolConfig::new("shape-search").with_workers(0);
        let result = WorkerPool::<f64, f64>::spawn(&config);
        assert!(matches!(result, Err(SearchError::Worker(_))));
    }
}
