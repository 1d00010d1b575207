//! Tests for input sensitivity scoring
//!
//! These tests verify:
//! - Scores are non-negative and sum to one per outcome
//! - A constant outcome scores all-zero instead of dividing by zero
//! - Inputs that drive an outcome outrank inert ones decisively
//! - Categorical inputs participate through their encoded view
//! - Selection validation and seed determinism

use crate::analysis::{ScoreConfig, score_inputs};
use crate::error::AnalysisError;
use crate::evaluator::{BatchConfig, run_experiments};
use crate::model::{
    Dimension, DimensionKind, ExperimentDesign, Model, ResultTable, RunOutput, Value,
};
use crate::sampling::{SampleOptions, reference_policy, sample_uncertainties};
use crate::tests::support::StubModel;

fn table_for<M: Model>(model: &M, lever: &str, scenarios: usize, seed: u64) -> ResultTable {
    let sampled = sample_uncertainties(model, scenarios, &SampleOptions::seeded(seed)).unwrap();
    let policy = reference_policy(model, "zero", &[(lever, Value::Int(0))]).unwrap();
    let design = ExperimentDesign::build(model, sampled, vec![policy]).unwrap();
    run_experiments(model, &design, &BatchConfig::default(), None)
        .unwrap()
        .table
}

/// Two continuous uncertainties and a closure over them.
fn two_input_model(f: impl Fn(f64, f64) -> f64 + Send + Sync + 'static) -> StubModel {
    StubModel::new(
        vec![
            Dimension::continuous("a", DimensionKind::Uncertainty, 0.0, 1.0),
            Dimension::continuous("b", DimensionKind::Uncertainty, 0.0, 1.0),
        ],
        vec![Dimension::integer("l", DimensionKind::Lever, 0, 1)],
        &["y"],
        move |scenario, _policy, _ctx| {
            let a = scenario.value("a").unwrap().as_f64().unwrap();
            let b = scenario.value("b").unwrap().as_f64().unwrap();
            Ok(RunOutput::new().scalar("y", f(a, b)))
        },
    )
}

/// Test that scores are non-negative and normalized per outcome
#[test]
fn test_scores_sum_to_one() {
    let model = two_input_model(|a, b| 3.0 * a + b);
    let table = table_for(&model, "l", 50, 41);

    let matrix = score_inputs(&table, &["a", "b"], &["y"], &ScoreConfig::default()).unwrap();

    let column = matrix.column("y").unwrap();
    let sum: f64 = column.iter().map(|(_, score)| score).sum();
    assert!(
        (sum - 1.0).abs() < 1e-9,
        "scores should sum to 1, got {sum}"
    );
    for (name, score) in &column {
        assert!(*score >= 0.0, "score for '{name}' is negative: {score}");
    }
    // Both inputs move y, the 3x one more.
    assert!(
        matrix.get("a", "y").unwrap() > matrix.get("b", "y").unwrap(),
        "the stronger coefficient should score higher"
    );
}

/// Test that a constant outcome yields all-zero scores
#[test]
fn test_constant_outcome_scores_zero() {
    let model = two_input_model(|_, _| 42.0);
    let table = table_for(&model, "l", 30, 42);

    let matrix = score_inputs(&table, &["a", "b"], &["y"], &ScoreConfig::default()).unwrap();

    assert_eq!(matrix.get("a", "y"), Some(0.0));
    assert_eq!(matrix.get("b", "y"), Some(0.0));
}

/// Test that the driving input decisively outranks an inert one
#[test]
fn test_driving_input_outranks_inert() {
    let model = two_input_model(|a, _| 5.0 * a);
    let table = table_for(&model, "l", 50, 43);

    let matrix = score_inputs(&table, &["a", "b"], &["y"], &ScoreConfig::default()).unwrap();

    let score_a = matrix.get("a", "y").unwrap();
    let score_b = matrix.get("b", "y").unwrap();
    assert!(score_a > 0.9, "driving input scored only {score_a}");
    assert!(score_b < 0.1, "inert input scored {score_b}");
    assert!(
        score_a > 3.0 * score_b,
        "expected a clear margin, got a={score_a} b={score_b}"
    );

    let ranked = matrix.ranked("y").unwrap();
    assert_eq!(ranked[0].0, "a", "ranking must lead with the driving input");
    assert!(
        ranked[0].1 >= ranked[1].1,
        "ranking must be descending by score"
    );
}

/// Test that categorical inputs drive scores through their level encoding
#[test]
fn test_categorical_input_scored() {
    let model = StubModel::new(
        vec![
            Dimension::categorical(
                "c",
                DimensionKind::Uncertainty,
                ["low", "mid", "high"],
            ),
            Dimension::continuous("u", DimensionKind::Uncertainty, 0.0, 1.0),
        ],
        vec![Dimension::integer("l", DimensionKind::Lever, 0, 1)],
        &["y"],
        |scenario, _policy, _ctx| {
            let y = match scenario.value("c").unwrap().as_level().unwrap() {
                "low" => 0.0,
                "mid" => 10.0,
                "high" => 20.0,
                other => panic!("unexpected level '{other}'"),
            };
            Ok(RunOutput::new().scalar("y", y))
        },
    );
    let table = table_for(&model, "l", 30, 44);

    let matrix = score_inputs(&table, &["c", "u"], &["y"], &ScoreConfig::default()).unwrap();

    let score_c = matrix.get("c", "y").unwrap();
    assert!(
        score_c > 0.8,
        "categorical driver should dominate, got {score_c}"
    );
}

/// Test that the same seed reproduces the matrix
#[test]
fn test_scoring_determinism() {
    let model = two_input_model(|a, b| a * b + a);
    let table = table_for(&model, "l", 40, 45);
    let config = ScoreConfig {
        seed: 5,
        ..ScoreConfig::default()
    };

    let first = score_inputs(&table, &["a", "b"], &["y"], &config).unwrap();
    let second = score_inputs(&table, &["a", "b"], &["y"], &config).unwrap();

    assert_eq!(first.get("a", "y"), second.get("a", "y"));
    assert_eq!(first.get("b", "y"), second.get("b", "y"));
}

/// Test that scoring covers several outcomes independently
#[test]
fn test_multiple_outcomes_scored_independently() {
    let model = StubModel::new(
        vec![
            Dimension::continuous("a", DimensionKind::Uncertainty, 0.0, 1.0),
            Dimension::continuous("b", DimensionKind::Uncertainty, 0.0, 1.0),
        ],
        vec![Dimension::integer("l", DimensionKind::Lever, 0, 1)],
        &["first", "second"],
        |scenario, _policy, _ctx| {
            let a = scenario.value("a").unwrap().as_f64().unwrap();
            let b = scenario.value("b").unwrap().as_f64().unwrap();
            Ok(RunOutput::new()
                .scalar("first", 10.0 * a)
                .scalar("second", 10.0 * b))
        },
    );
    let table = table_for(&model, "l", 50, 46);

    let matrix =
        score_inputs(&table, &["a", "b"], &["first", "second"], &ScoreConfig::default()).unwrap();

    assert!(
        matrix.get("a", "first").unwrap() > matrix.get("b", "first").unwrap(),
        "'first' is driven by a"
    );
    assert!(
        matrix.get("b", "second").unwrap() > matrix.get("a", "second").unwrap(),
        "'second' is driven by b"
    );
}

/// Test that an unknown input column is rejected
#[test]
fn test_unknown_input_rejected() {
    let model = two_input_model(|a, _| a);
    let table = table_for(&model, "l", 10, 47);

    let result = score_inputs(&table, &["z"], &["y"], &ScoreConfig::default());

    assert!(
        matches!(result, Err(AnalysisError::UnknownColumn { ref column }) if column == "z"),
        "expected UnknownColumn, got {result:?}"
    );
}

/// Test that empty selections are rejected
#[test]
fn test_empty_selection_rejected() {
    let model = two_input_model(|a, _| a);
    let table = table_for(&model, "l", 10, 48);

    let no_inputs = score_inputs(&table, &[], &["y"], &ScoreConfig::default());
    let no_outcomes = score_inputs(&table, &["a"], &[], &ScoreConfig::default());

    assert!(matches!(no_inputs, Err(AnalysisError::EmptySelection)));
    assert!(matches!(no_outcomes, Err(AnalysisError::EmptySelection)));
}
