//! Tests for result table assembly and accessors
//!
//! These tests verify:
//! - The strict one-outcome-per-run join (duplicates, gaps, strays)
//! - Outcome column union in first-observed order
//! - Provenance on every row and retained failure markers
//! - Scalar and encoded column extraction

use crate::aggregate::assemble;
use crate::error::{AggregationError, AnalysisError};
use crate::model::{
    ExperimentDesign, FailureReason, OutcomeValue, RunFailure, RunId, RunOutcome, RunOutput,
    RunPayload, Value,
};
use crate::sampling::{SampleOptions, sample_levers, sample_uncertainties};
use crate::tests::support::StubModel;

fn small_design(model: &StubModel) -> ExperimentDesign {
    let scenarios = sample_uncertainties(model, 2, &SampleOptions::seeded(21)).unwrap();
    let policies = sample_levers(model, 2, &SampleOptions::seeded(22)).unwrap();
    ExperimentDesign::build(model, scenarios, policies).unwrap()
}

fn completed(id: u32, output: RunOutput) -> RunOutcome {
    RunOutcome {
        run_id: RunId(id),
        payload: RunPayload::Completed(output),
    }
}

fn failed(id: u32) -> RunOutcome {
    RunOutcome {
        run_id: RunId(id),
        payload: RunPayload::Failed(RunFailure {
            reason: FailureReason::Model,
            detail: "boom".to_string(),
        }),
    }
}

fn damage(value: f64) -> RunOutput {
    RunOutput::new().scalar("damage", value)
}

/// Test that two outcomes for one run id are rejected
#[test]
fn test_duplicate_outcome_rejected() {
    let model = StubModel::flood();
    let design = small_design(&model);
    let outcomes = vec![
        completed(0, damage(1.0)),
        completed(1, damage(2.0)),
        completed(1, damage(3.0)),
        completed(2, damage(4.0)),
    ];

    let result = assemble(&design, outcomes);

    assert!(
        matches!(result, Err(AggregationError::DuplicateOutcome { run_id: RunId(1) })),
        "expected DuplicateOutcome for run 1, got {result:?}"
    );
}

/// Test that an outcome for a run outside the design is rejected
#[test]
fn test_unknown_run_id_rejected() {
    let model = StubModel::flood();
    let design = small_design(&model);
    let outcomes = vec![completed(0, damage(1.0)), completed(99, damage(2.0))];

    let result = assemble(&design, outcomes);

    assert!(
        matches!(result, Err(AggregationError::UnknownRunId { run_id: RunId(99) })),
        "expected UnknownRunId for run 99, got {result:?}"
    );
}

/// Test that a design run with no outcome is rejected
#[test]
fn test_missing_outcome_rejected() {
    let model = StubModel::flood();
    let design = small_design(&model);
    let outcomes = vec![
        completed(0, damage(1.0)),
        completed(1, damage(2.0)),
        completed(3, damage(4.0)),
    ];

    let result = assemble(&design, outcomes);

    assert!(
        matches!(result, Err(AggregationError::IncompleteResultSet { run_id: RunId(2) })),
        "expected IncompleteResultSet for run 2, got {result:?}"
    );
}

/// Test that outcome columns union in first-observed order over run ids
#[test]
fn test_column_union_first_observed_order() {
    let model = StubModel::flood();
    let design = small_design(&model);
    let outcomes = vec![
        completed(0, RunOutput::new().scalar("damage", 1.0)),
        completed(
            1,
            RunOutput::new().scalar("damage", 2.0).scalar("deaths", 0.1),
        ),
        completed(2, RunOutput::new().scalar("deaths", 0.2)),
        completed(3, RunOutput::new().scalar("deaths", 0.3)),
    ];

    let table = assemble(&design, outcomes).unwrap();

    assert_eq!(table.outcome_columns(), ["damage", "deaths"]);
    // Run 0 never reported "deaths": explicit missing marker, not a zero.
    assert!(table.row(RunId(0)).unwrap().outcome("deaths").is_none());
    let deaths = table.scalar_outcome("deaths");
    assert!(
        matches!(
            deaths,
            Err(AnalysisError::MissingValue { ref column, run_id: RunId(0) }) if column == "deaths"
        ),
        "a gappy column must fail extraction eagerly, got {deaths:?}"
    );
}

/// Test that every row carries scenario, policy, and ordered inputs
#[test]
fn test_rows_keep_provenance() {
    let model = StubModel::flood();
    let design = small_design(&model);
    let outcomes = (0..4).map(|id| completed(id, damage(id as f64))).collect();

    let table = assemble(&design, outcomes).unwrap();

    // Scenario-major layout: id 2 is the second scenario under the first policy.
    let row = table.row(RunId(2)).unwrap();
    assert_eq!(row.scenario(), "scenario_1");
    assert_eq!(row.policy(), "policy_0");
    assert_eq!(
        row.inputs().len(),
        3,
        "inputs hold both uncertainties plus the lever"
    );
    let expected = design.request(RunId(2)).unwrap();
    assert_eq!(
        row.inputs()[0],
        *expected.scenario.value("bmax").unwrap(),
        "input column order must follow dimension declaration"
    );
    assert_eq!(row.inputs()[2], *expected.policy.value("rfr").unwrap());

    let names: Vec<&str> = table.dimensions().iter().map(|d| d.name()).collect();
    assert_eq!(names, ["bmax", "pfail", "rfr"]);
}

/// Test that failed runs keep their rows and markers
#[test]
fn test_failed_rows_retained() {
    let model = StubModel::flood();
    let design = small_design(&model);
    let outcomes = vec![
        completed(0, damage(1.0)),
        failed(1),
        completed(2, damage(3.0)),
        completed(3, damage(4.0)),
    ];

    let table = assemble(&design, outcomes).unwrap();

    assert_eq!(table.len(), 4);
    assert_eq!(table.completed_count(), 3);
    assert_eq!(table.failed_count(), 1);
    let row = table.row(RunId(1)).unwrap();
    assert!(!row.is_completed());
    assert_eq!(row.failure().unwrap().reason, FailureReason::Model);
    assert!(
        table.completed_rows().all(|r| r.run_id() != RunId(1)),
        "failed rows must not appear among completed rows"
    );
    // The failed row still reads back its inputs for later analysis.
    assert_eq!(row.inputs().len(), 3);
}

/// Test that series outcomes are preserved but rejected by scalar extraction
#[test]
fn test_series_column_not_scalar() {
    let model = StubModel::flood();
    let design = small_design(&model);
    let water = vec![0.0, 0.4, 1.2];
    let outcomes = (0..4)
        .map(|id| {
            completed(
                id,
                RunOutput::new()
                    .scalar("damage", 1.0)
                    .series("water_level", water.clone()),
            )
        })
        .collect();

    let table = assemble(&design, outcomes).unwrap();

    let row = table.row(RunId(0)).unwrap();
    assert_eq!(
        row.outcome("water_level"),
        Some(&OutcomeValue::Series(water.clone()))
    );
    assert_eq!(row.outcome("water_level").unwrap().last(), Some(1.2));
    let result = table.scalar_outcome("water_level");
    assert!(
        matches!(result, Err(AnalysisError::NonScalarColumn { ref column }) if column == "water_level"),
        "expected NonScalarColumn, got {result:?}"
    );
}

/// Test that encoded input columns cover continuous and categorical dimensions
#[test]
fn test_encoded_input_columns() {
    let model = StubModel::flood();
    let design = small_design(&model);
    let outcomes = (0..4).map(|id| completed(id, damage(id as f64))).collect();
    let table = assemble(&design, outcomes).unwrap();

    let encoded = table.encoded_input("rfr").unwrap();
    assert_eq!(encoded.len(), 4);
    for (run_id, value) in &encoded {
        let raw = match table.row(*run_id).unwrap().inputs()[2] {
            Value::Int(v) => v as f64,
            ref other => panic!("rfr should be an integer value, got {other:?}"),
        };
        assert_eq!(*value, raw, "integer dimensions encode as themselves");
    }

    let unknown = table.encoded_input("tide");
    assert!(
        matches!(unknown, Err(AnalysisError::UnknownColumn { ref column }) if column == "tide"),
        "expected UnknownColumn, got {unknown:?}"
    );
}
