//! The run contract: what a model receives and what it reports back.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Dimension, Policy, RunId, Scenario};

/// Error returned by a model invocation.
///
/// Carries only a printable detail; the engine records it on the run's
/// failure marker and moves on to the next run.
#[derive(Debug, Clone)]
pub struct ModelError(String);

impl ModelError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ModelError {}

/// Engine-provided metadata for one run
#[derive(Debug, Clone, Copy)]
pub struct RunContext {
    pub run_id: RunId,
    /// Replication seed for stochastic models, derived as the batch base
    /// seed plus the run id. Propagated, not enforced: a model that ignores
    /// it simply is not reproducible.
    pub seed: u64,
}

/// The simulation model under study.
///
/// The engine treats a run as a pure function of (scenario, policy) plus the
/// run context; implementations must not share mutable state between runs.
/// `Sync` is required because the runner invokes the model from several
/// worker threads at once.
pub trait Model: Sync {
    /// Declared uncertainty dimensions, in column order.
    fn uncertainties(&self) -> &[Dimension];

    /// Declared lever dimensions, in column order.
    fn levers(&self) -> &[Dimension];

    /// Declared outcome variable names.
    fn outcomes(&self) -> &[String];

    /// Evaluate one fully-bound point.
    fn run(
        &self,
        scenario: &Scenario,
        policy: &Policy,
        ctx: &RunContext,
    ) -> Result<RunOutput, ModelError>;
}

/// One reported outcome variable: a scalar or a per-step series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutcomeValue {
    Scalar(f64),
    Series(Vec<f64>),
}

impl OutcomeValue {
    #[must_use]
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            OutcomeValue::Scalar(v) => Some(*v),
            OutcomeValue::Series(_) => None,
        }
    }

    /// Arithmetic mean of a series, or the scalar itself. `None` for an
    /// empty series.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        match self {
            OutcomeValue::Scalar(v) => Some(*v),
            OutcomeValue::Series(vs) if vs.is_empty() => None,
            OutcomeValue::Series(vs) => Some(vs.iter().sum::<f64>() / vs.len() as f64),
        }
    }

    /// Final element of a series, or the scalar itself.
    #[must_use]
    pub fn last(&self) -> Option<f64> {
        match self {
            OutcomeValue::Scalar(v) => Some(*v),
            OutcomeValue::Series(vs) => vs.last().copied(),
        }
    }
}

/// The outcome variables reported by one model invocation.
///
/// Insertion order is preserved; the aggregator derives the table's outcome
/// column order from it (first observed over ascending run ids).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    values: Vec<(String, OutcomeValue)>,
}

impl RunOutput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a scalar outcome. Reporting the same name twice replaces the
    /// earlier value.
    #[must_use]
    pub fn scalar(self, name: impl Into<String>, value: f64) -> Self {
        self.with(name, OutcomeValue::Scalar(value))
    }

    /// Report a per-step series outcome.
    #[must_use]
    pub fn series(self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.with(name, OutcomeValue::Series(values))
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: OutcomeValue) -> Self {
        let name = name.into();
        if let Some(slot) = self.values.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.values.push((name, value));
        }
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OutcomeValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OutcomeValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Why a run produced no output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// The model returned an error
    Model,
    /// The model invocation panicked
    Panic,
    /// The run exceeded the configured per-run timeout
    Timeout,
    /// The model returned an output with no outcome variables
    EmptyOutput,
    /// The run was never dispatched because the batch halted early
    Skipped,
}

impl FailureReason {
    /// Stable single-token form, used in exports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FailureReason::Model => "model_error",
            FailureReason::Panic => "panic",
            FailureReason::Timeout => "timeout",
            FailureReason::EmptyOutput => "empty_output",
            FailureReason::Skipped => "skipped",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure marker recorded in place of a run's output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFailure {
    pub reason: FailureReason,
    pub detail: String,
}

/// What one run produced: an output, or a contained failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunPayload {
    Completed(RunOutput),
    Failed(RunFailure),
}

impl RunPayload {
    #[must_use]
    pub fn output(&self) -> Option<&RunOutput> {
        match self {
            RunPayload::Completed(output) => Some(output),
            RunPayload::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&RunFailure> {
        match self {
            RunPayload::Completed(_) => None,
            RunPayload::Failed(failure) => Some(failure),
        }
    }
}

/// The result of exactly one model invocation, tagged with its run id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: RunId,
    pub payload: RunPayload,
}
