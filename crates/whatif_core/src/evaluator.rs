//! Parallel experiment runner: executes a design against a model with a
//! bounded worker pool and per-run fault containment.
//!
//! Scheduling is an explicit task queue: workers claim run ids from a shared
//! atomic cursor, evaluate them, and send outcomes to the coordinating
//! thread, which inserts them into an arena indexed by run id — completion
//! order never touches row order. The scope join is the batch barrier; the
//! caller gets back either a full result table or, after an early halt, a
//! partial one whose never-dispatched rows are explicitly failure-marked.
//!
//! A model error, panic, or malformed output is contained to its own run.
//! The batch as a whole fails only when not a single run produced output.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::aggregate;
use crate::error::BatchError;
use crate::model::{
    ExperimentDesign, FailureReason, Model, ResultTable, RunContext, RunFailure, RunId,
    RunOutcome, RunPayload, RunRequest,
};
use crate::progress::RunObserver;

/// Configuration for one experiment batch
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Worker threads draining the run queue
    pub workers: usize,
    /// Per-run wall-clock timeout. A run exceeding it is failure-marked
    /// `Timeout` and its worker slot reclaimed. The timed-out invocation
    /// itself runs to completion on an abandoned thread and its late result
    /// is discarded; a model that never returns will stall batch teardown.
    pub run_timeout: Option<Duration>,
    /// Halt dispatch once `failed / design size` strictly exceeds this
    /// ratio. The default of 1.0 never halts early.
    pub max_failure_ratio: f64,
    /// Base replication seed; run `k` executes with seed `base_seed + k`.
    pub base_seed: u64,
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            run_timeout: None,
            max_failure_ratio: 1.0,
            base_seed: 0,
        }
    }
}

/// Batch-level condition surfaced alongside a partial result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchWarning {
    /// Dispatch halted after failures crossed `max_failure_ratio`
    FailureRatioExceeded { failed: usize, dispatched: usize },
    /// Dispatch halted after the observer requested cancellation
    Cancelled { dispatched: usize },
}

impl fmt::Display for BatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchWarning::FailureRatioExceeded { failed, dispatched } => {
                write!(
                    f,
                    "dispatch halted: {failed} of {dispatched} dispatched runs failed"
                )
            }
            BatchWarning::Cancelled { dispatched } => {
                write!(f, "batch cancelled after {dispatched} dispatched runs")
            }
        }
    }
}

/// Counters for one finished batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    /// Runs that produced an output
    pub completed: usize,
    /// Runs that executed and failed
    pub failed: usize,
    /// Runs never dispatched because the batch halted early
    pub skipped: usize,
    pub elapsed: Duration,
}

/// Everything a batch produces: the table, counters, and any warnings.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub table: ResultTable,
    pub stats: BatchStats,
    pub warnings: Vec<BatchWarning>,
}

/// Execute every run in the design and assemble the result table.
///
/// Exactly one outcome is recorded per run id. Returns
/// `BatchError::AllRunsFailed` only when no run at all produced output;
/// any other mix of successes and failures comes back as a table with
/// failure-marked rows, plus warnings if dispatch halted early.
pub fn run_experiments<M: Model + ?Sized>(
    model: &M,
    design: &ExperimentDesign,
    config: &BatchConfig,
    observer: Option<&dyn RunObserver>,
) -> Result<BatchResult, BatchError> {
    let total = design.len();
    let worker_count = config.workers.max(1).min(total.max(1));
    let started = Instant::now();

    let shared = WorkerShared {
        model,
        design,
        config,
        observer,
        total,
        cursor: AtomicUsize::new(0),
        failed: AtomicUsize::new(0),
        halted: AtomicBool::new(false),
        ratio_halt: AtomicBool::new(false),
        cancel_halt: AtomicBool::new(false),
    };

    let (outcome_tx, outcome_rx) = mpsc::channel::<RunOutcome>();
    let mut arena: Vec<Option<RunOutcome>> = (0..total).map(|_| None).collect();

    thread::scope(|scope| {
        let shared = &shared;
        for _ in 0..worker_count {
            let tx = outcome_tx.clone();
            scope.spawn(move || worker_loop(shared, scope, &tx));
        }
        drop(outcome_tx);

        // Insertion is keyed strictly by run id; out-of-order completion
        // cannot corrupt the table.
        while let Ok(outcome) = outcome_rx.recv() {
            let idx = outcome.run_id.0 as usize;
            if idx < arena.len() {
                arena[idx] = Some(outcome);
            }
        }
    });

    let ratio_halt = shared.ratio_halt.load(Ordering::Relaxed);
    let cancel_halt = shared.cancel_halt.load(Ordering::Relaxed);
    let dispatched = shared.cursor.load(Ordering::Relaxed).min(total);

    // Never-claimed runs keep their rows so the table row count always
    // equals the design size.
    let mut skipped = 0usize;
    for (idx, slot) in arena.iter_mut().enumerate() {
        if slot.is_none() {
            skipped += 1;
            *slot = Some(RunOutcome {
                run_id: RunId(idx as u32),
                payload: RunPayload::Failed(RunFailure {
                    reason: FailureReason::Skipped,
                    detail: "not dispatched: batch halted early".to_string(),
                }),
            });
        }
    }

    let outcomes: Vec<RunOutcome> = arena.into_iter().flatten().collect();
    let table = aggregate::assemble(design, outcomes)?;

    let completed = table.completed_count();
    let failed = table.len() - completed - skipped;

    if completed == 0 && total > 0 {
        return Err(BatchError::AllRunsFailed { failed: table.len() });
    }

    let mut warnings = Vec::new();
    if ratio_halt {
        warnings.push(BatchWarning::FailureRatioExceeded { failed, dispatched });
    }
    if cancel_halt {
        warnings.push(BatchWarning::Cancelled { dispatched });
    }

    Ok(BatchResult {
        table,
        stats: BatchStats {
            completed,
            failed,
            skipped,
            elapsed: started.elapsed(),
        },
        warnings,
    })
}

struct WorkerShared<'a, M: ?Sized> {
    model: &'a M,
    design: &'a ExperimentDesign,
    config: &'a BatchConfig,
    observer: Option<&'a dyn RunObserver>,
    total: usize,
    cursor: AtomicUsize,
    failed: AtomicUsize,
    halted: AtomicBool,
    ratio_halt: AtomicBool,
    cancel_halt: AtomicBool,
}

fn worker_loop<'scope, 'env, M: Model + ?Sized>(
    shared: &'scope WorkerShared<'env, M>,
    scope: &'scope thread::Scope<'scope, 'env>,
    outcome_tx: &Sender<RunOutcome>,
) {
    let mut lane: Option<RunLane> = None;

    loop {
        if shared.halted.load(Ordering::Relaxed) {
            break;
        }
        if let Some(observer) = shared.observer
            && observer.is_cancelled()
        {
            shared.cancel_halt.store(true, Ordering::Relaxed);
            shared.halted.store(true, Ordering::Relaxed);
            break;
        }

        let idx = shared.cursor.fetch_add(1, Ordering::Relaxed);
        if idx >= shared.total {
            break;
        }
        let run_id = RunId(idx as u32);
        let seed = shared.config.base_seed.wrapping_add(idx as u64);

        let payload = match shared.config.run_timeout {
            Some(timeout) => run_with_timeout(shared, scope, &mut lane, run_id, seed, timeout),
            None => match shared.design.request(run_id) {
                Some(request) => evaluate_request(shared.model, &request, seed),
                None => break,
            },
        };

        match &payload {
            RunPayload::Completed(_) => {
                if let Some(observer) = shared.observer {
                    observer.on_run_completed(run_id);
                }
            }
            RunPayload::Failed(failure) => {
                if let Some(observer) = shared.observer {
                    observer.on_run_failed(run_id, failure);
                }
                let failed = shared.failed.fetch_add(1, Ordering::Relaxed) + 1;
                if failed as f64 / shared.total as f64 > shared.config.max_failure_ratio {
                    shared.ratio_halt.store(true, Ordering::Relaxed);
                    shared.halted.store(true, Ordering::Relaxed);
                }
            }
        }

        if outcome_tx.send(RunOutcome { run_id, payload }).is_err() {
            break;
        }
    }
}

/// Run one request on the worker's lane thread, bounded by the timeout.
fn run_with_timeout<'scope, 'env, M: Model + ?Sized>(
    shared: &'scope WorkerShared<'env, M>,
    scope: &'scope thread::Scope<'scope, 'env>,
    lane: &mut Option<RunLane>,
    run_id: RunId,
    seed: u64,
    timeout: Duration,
) -> RunPayload {
    let active = match lane.take() {
        Some(active) => active,
        None => spawn_lane(scope, shared.model, shared.design),
    };

    if active.job_tx.send((run_id, seed)).is_err() {
        return RunPayload::Failed(RunFailure {
            reason: FailureReason::Panic,
            detail: "run lane terminated unexpectedly".to_string(),
        });
    }

    match active.result_rx.recv_timeout(timeout) {
        Ok(payload) => {
            *lane = Some(active);
            payload
        }
        Err(RecvTimeoutError::Timeout) => {
            // Abandoning the lane closes its channels: the straggler's
            // eventual result is discarded and the lane thread exits. The
            // worker slot continues with a fresh lane on the next run.
            drop(active);
            RunPayload::Failed(RunFailure {
                reason: FailureReason::Timeout,
                detail: format!("run exceeded the per-run timeout of {timeout:?}"),
            })
        }
        Err(RecvTimeoutError::Disconnected) => RunPayload::Failed(RunFailure {
            reason: FailureReason::Panic,
            detail: "run lane terminated unexpectedly".to_string(),
        }),
    }
}

/// A helper thread executing runs on behalf of one worker, so the worker
/// can give up waiting without losing its pool slot.
struct RunLane {
    job_tx: Sender<(RunId, u64)>,
    result_rx: Receiver<RunPayload>,
}

fn spawn_lane<'scope, 'env, M: Model + ?Sized>(
    scope: &'scope thread::Scope<'scope, 'env>,
    model: &'env M,
    design: &'env ExperimentDesign,
) -> RunLane {
    let (job_tx, job_rx) = mpsc::channel::<(RunId, u64)>();
    let (result_tx, result_rx) = mpsc::channel();
    scope.spawn(move || {
        while let Ok((run_id, seed)) = job_rx.recv() {
            let Some(request) = design.request(run_id) else {
                break;
            };
            let payload = evaluate_request(model, &request, seed);
            if result_tx.send(payload).is_err() {
                break;
            }
        }
    });
    RunLane { job_tx, result_rx }
}

/// Invoke the model once, containing errors, panics, and malformed output.
fn evaluate_request<M: Model + ?Sized>(
    model: &M,
    request: &RunRequest<'_>,
    seed: u64,
) -> RunPayload {
    let ctx = RunContext {
        run_id: request.run_id,
        seed,
    };
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        model.run(request.scenario, request.policy, &ctx)
    }));
    match result {
        Ok(Ok(output)) if output.is_empty() => RunPayload::Failed(RunFailure {
            reason: FailureReason::EmptyOutput,
            detail: "model reported no outcome variables".to_string(),
        }),
        Ok(Ok(output)) => RunPayload::Completed(output),
        Ok(Err(e)) => RunPayload::Failed(RunFailure {
            reason: FailureReason::Model,
            detail: e.to_string(),
        }),
        Err(panic) => RunPayload::Failed(RunFailure {
            reason: FailureReason::Panic,
            detail: panic_detail(panic.as_ref()),
        }),
    }
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "model panicked".to_string()
    }
}
