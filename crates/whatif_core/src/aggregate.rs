//! Assembly of raw run outcomes into a provenance-keyed result table.
//!
//! The join between design and outcomes is strict: exactly one outcome per
//! run id, no extras, no gaps. Outcome columns are the union of names seen
//! across completed runs, ordered by first observation in ascending run id,
//! so the same batch always yields the same column layout.

use crate::error::AggregationError;
use crate::model::{
    Dimension, ExperimentDesign, ResultRow, ResultTable, RunOutcome, RunPayload, Value,
};

/// Join run outcomes back onto the design they came from.
///
/// Rows appear in run id order regardless of the order outcomes arrive in.
/// Failed runs keep their rows; only completed runs contribute outcome
/// columns.
pub fn assemble(
    design: &ExperimentDesign,
    outcomes: Vec<RunOutcome>,
) -> Result<ResultTable, AggregationError> {
    let total = design.len();
    let mut arena: Vec<Option<RunOutcome>> = (0..total).map(|_| None).collect();

    for outcome in outcomes {
        let idx = outcome.run_id.0 as usize;
        if idx >= total {
            return Err(AggregationError::UnknownRunId {
                run_id: outcome.run_id,
            });
        }
        if arena[idx].is_some() {
            return Err(AggregationError::DuplicateOutcome {
                run_id: outcome.run_id,
            });
        }
        arena[idx] = Some(outcome);
    }

    // Union of outcome names in first-observed order. A run missing a
    // later-introduced column reads back as absent, never as zero.
    let mut outcome_columns: Vec<String> = Vec::new();
    for slot in &arena {
        if let Some(outcome) = slot
            && let RunPayload::Completed(output) = &outcome.payload
        {
            for (name, _) in output.iter() {
                if !outcome_columns.iter().any(|c| c == name) {
                    outcome_columns.push(name.to_string());
                }
            }
        }
    }

    let mut rows = Vec::with_capacity(total);
    for (request, slot) in design.iter().zip(arena) {
        let Some(outcome) = slot else {
            return Err(AggregationError::IncompleteResultSet {
                run_id: request.run_id,
            });
        };
        let inputs: Vec<Value> = request
            .scenario
            .values()
            .chain(request.policy.values())
            .map(|(_, value)| value.clone())
            .collect();
        rows.push(ResultRow::new(
            outcome.run_id,
            request.scenario.name().to_string(),
            request.policy.name().to_string(),
            inputs,
            outcome.payload,
        ));
    }

    let dimensions: Vec<Dimension> = design.dimensions().cloned().collect();
    Ok(ResultTable::new(dimensions, outcome_columns, rows))
}
