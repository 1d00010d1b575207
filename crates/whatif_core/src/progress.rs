//! Run observers: progress tracking and cancellation for experiment batches.
//!
//! The runner itself performs no logging or console output; it notifies an
//! injectable [`RunObserver`] as runs finish, and polls it for cancellation
//! between dispatches. [`BatchProgress`] is the bundled implementation for
//! callers that just want counters and a cancel flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::model::{RunFailure, RunId};

/// Callback interface the runner notifies per finished run.
///
/// Implementations must be thread-safe: workers invoke these concurrently.
/// All methods default to no-ops so observers implement only what they care
/// about.
pub trait RunObserver: Sync {
    /// A run completed and its output was recorded.
    fn on_run_completed(&self, _run_id: RunId) {}

    /// A run failed; the failure marker is recorded in the table.
    fn on_run_failed(&self, _run_id: RunId, _failure: &RunFailure) {}

    /// Polled by workers before claiming the next run. Returning `true`
    /// stops dispatch; in-flight runs still finish.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shared atomic counters plus a cancellation flag.
///
/// Clones share state, so one handle can be given to the runner while
/// another is polled (or cancelled) from elsewhere.
#[derive(Debug, Clone, Default)]
pub struct BatchProgress {
    completed: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
}

impl BatchProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs completed so far.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Runs failed so far (runs that executed and produced a failure marker;
    /// never-dispatched runs are not counted).
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    /// Request cancellation of the batch.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl RunObserver for BatchProgress {
    fn on_run_completed(&self, _run_id: RunId) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    fn on_run_failed(&self, _run_id: RunId, _failure: &RunFailure) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
