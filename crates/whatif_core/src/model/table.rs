//! The result table: one row per run id, inputs joined with outcomes.

use rustc_hash::FxHashMap;

use crate::error::AnalysisError;

use super::{Dimension, OutcomeValue, RunFailure, RunId, RunOutput, RunPayload, Value};

/// One row of the result table, carrying full provenance for its run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    run_id: RunId,
    scenario: String,
    policy: String,
    inputs: Vec<Value>,
    payload: RunPayload,
}

impl ResultRow {
    pub(crate) fn new(
        run_id: RunId,
        scenario: String,
        policy: String,
        inputs: Vec<Value>,
        payload: RunPayload,
    ) -> Self {
        Self {
            run_id,
            scenario,
            policy,
            inputs,
            payload,
        }
    }

    #[must_use]
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    #[must_use]
    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    #[must_use]
    pub fn policy(&self) -> &str {
        &self.policy
    }

    /// Bound input values, aligned with the table's dimension order.
    #[must_use]
    pub fn inputs(&self) -> &[Value] {
        &self.inputs
    }

    #[must_use]
    pub fn payload(&self) -> &RunPayload {
        &self.payload
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self.payload, RunPayload::Completed(_))
    }

    #[must_use]
    pub fn output(&self) -> Option<&RunOutput> {
        self.payload.output()
    }

    #[must_use]
    pub fn failure(&self) -> Option<&RunFailure> {
        self.payload.failure()
    }

    /// The reported value for one outcome variable. `None` for failed rows
    /// and for optional variables this run did not emit — the explicit
    /// missing-value marker.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<&OutcomeValue> {
        self.output().and_then(|output| output.get(name))
    }
}

/// The single shared artifact of a batch: the join of every run request
/// with its outcome, in run-id order.
///
/// Failed rows are retained with their failure markers, never silently
/// dropped; callers that want only survivors filter via `completed_rows`.
#[derive(Debug, Clone)]
pub struct ResultTable {
    dimensions: Vec<Dimension>,
    outcome_columns: Vec<String>,
    column_index: FxHashMap<String, usize>,
    rows: Vec<ResultRow>,
}

impl ResultTable {
    pub(crate) fn new(
        dimensions: Vec<Dimension>,
        outcome_columns: Vec<String>,
        rows: Vec<ResultRow>,
    ) -> Self {
        let column_index = outcome_columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            dimensions,
            outcome_columns,
            column_index,
            rows,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Input dimensions in column order: uncertainties, then levers.
    #[must_use]
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    #[must_use]
    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name() == name)
    }

    /// Outcome column names: union over all completed runs, in first
    /// observed order (ascending run id).
    #[must_use]
    pub fn outcome_columns(&self) -> &[String] {
        &self.outcome_columns
    }

    #[must_use]
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    #[must_use]
    pub fn row(&self, run_id: RunId) -> Option<&ResultRow> {
        self.rows.get(run_id.0 as usize)
    }

    pub fn completed_rows(&self) -> impl Iterator<Item = &ResultRow> {
        self.rows.iter().filter(|r| r.is_completed())
    }

    pub fn failed_rows(&self) -> impl Iterator<Item = &ResultRow> {
        self.rows.iter().filter(|r| !r.is_completed())
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed_rows().count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.len() - self.completed_count()
    }

    /// Scalar view of one outcome column over completed rows, ascending
    /// run id.
    ///
    /// Errors if the column is unknown, holds series values, or is missing
    /// in some completed row — the analysis passes refuse to silently drop
    /// rows.
    pub fn scalar_outcome(&self, name: &str) -> Result<Vec<(RunId, f64)>, AnalysisError> {
        if !self.column_index.contains_key(name) {
            return Err(AnalysisError::UnknownColumn {
                column: name.to_string(),
            });
        }
        let mut column = Vec::with_capacity(self.rows.len());
        for row in self.completed_rows() {
            match row.outcome(name) {
                Some(OutcomeValue::Scalar(v)) => column.push((row.run_id(), *v)),
                Some(OutcomeValue::Series(_)) => {
                    return Err(AnalysisError::NonScalarColumn {
                        column: name.to_string(),
                    });
                }
                None => {
                    return Err(AnalysisError::MissingValue {
                        column: name.to_string(),
                        run_id: row.run_id(),
                    });
                }
            }
        }
        Ok(column)
    }

    /// Numerically encoded view of one input dimension over completed rows,
    /// ascending run id. Categorical values encode as their declared level
    /// index.
    pub fn encoded_input(&self, name: &str) -> Result<Vec<(RunId, f64)>, AnalysisError> {
        let Some(idx) = self.dimensions.iter().position(|d| d.name() == name) else {
            return Err(AnalysisError::UnknownColumn {
                column: name.to_string(),
            });
        };
        let domain = self.dimensions[idx].domain();
        let mut column = Vec::with_capacity(self.rows.len());
        for row in self.completed_rows() {
            match domain.encode(&row.inputs()[idx]) {
                Some(v) => column.push((row.run_id(), v)),
                None => {
                    return Err(AnalysisError::MissingValue {
                        column: name.to_string(),
                        run_id: row.run_id(),
                    });
                }
            }
        }
        Ok(column)
    }
}
