//! Batch observer that reports run progress through tracing.

use std::sync::atomic::{AtomicUsize, Ordering};

use whatif_core::model::{RunFailure, RunId};
use whatif_core::progress::RunObserver;

/// Logs every failure as it happens and overall progress at a coarse
/// interval, so large batches stay quiet without going dark.
pub struct LogObserver {
    total: usize,
    interval: usize,
    finished: AtomicUsize,
}

impl LogObserver {
    #[must_use]
    pub fn new(total: usize) -> Self {
        // Roughly twenty progress lines per batch.
        let interval = (total / 20).max(1);
        Self {
            total,
            interval,
            finished: AtomicUsize::new(0),
        }
    }

    fn tick(&self) {
        let finished = self.finished.fetch_add(1, Ordering::Relaxed) + 1;
        if finished % self.interval == 0 || finished == self.total {
            tracing::info!(finished = finished, total = self.total, "Batch progress");
        }
    }
}

impl RunObserver for LogObserver {
    fn on_run_completed(&self, _run_id: RunId) {
        self.tick();
    }

    fn on_run_failed(&self, run_id: RunId, failure: &RunFailure) {
        tracing::warn!(
            run = run_id.0,
            reason = failure.reason.as_str(),
            detail = %failure.detail,
            "Run failed"
        );
        self.tick();
    }
}
