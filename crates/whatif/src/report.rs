//! Report rendering: result tables to CSV and JSON, analyses to text.
//!
//! Rendering is split from writing so the console paths and the file paths
//! share one formatter per artifact.

use std::fs;
use std::path::Path;

use serde::Serialize;

use whatif_core::analysis::{ClusterAssignment, FeatureScoreMatrix};
use whatif_core::evaluator::BatchStats;
use whatif_core::model::{OutcomeValue, ResultTable, RunFailure, RunOutput, Value};

/// Render the full result table as CSV: one row per run, provenance and
/// status first, then inputs in dimension order, then outcome columns.
/// Failed runs keep their row with empty outcome cells.
#[must_use]
pub fn render_csv(table: &ResultTable) -> String {
    let mut out = String::new();

    out.push_str("run_id,scenario,policy,status");
    for dim in table.dimensions() {
        out.push(',');
        out.push_str(&csv_field(dim.name()));
    }
    for column in table.outcome_columns() {
        out.push(',');
        out.push_str(&csv_field(column));
    }
    out.push('\n');

    for row in table.rows() {
        let status = match row.failure() {
            None => "ok",
            Some(failure) => failure.reason.as_str(),
        };
        out.push_str(&format!(
            "{},{},{},{}",
            row.run_id().0,
            csv_field(row.scenario()),
            csv_field(row.policy()),
            status
        ));
        for value in row.inputs() {
            out.push(',');
            out.push_str(&csv_field(&value.to_string()));
        }
        for column in table.outcome_columns() {
            out.push(',');
            if let Some(value) = row.outcome(column) {
                out.push_str(&csv_field(&render_outcome(value)));
            }
        }
        out.push('\n');
    }

    out
}

pub fn write_csv(table: &ResultTable, path: &Path) -> color_eyre::Result<()> {
    fs::write(path, render_csv(table))?;
    Ok(())
}

fn render_outcome(value: &OutcomeValue) -> String {
    match value {
        OutcomeValue::Scalar(v) => v.to_string(),
        OutcomeValue::Series(vs) => vs
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(";"),
    }
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

/// Serializable view of a study: the result table plus whichever analysis
/// artifacts the command produced.
#[derive(Serialize)]
pub struct JsonReport<'a> {
    dimensions: Vec<&'a str>,
    outcome_columns: &'a [String],
    rows: Vec<JsonRow<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    clusters: Option<&'a ClusterAssignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scores: Option<&'a FeatureScoreMatrix>,
}

#[derive(Serialize)]
struct JsonRow<'a> {
    run_id: u32,
    scenario: &'a str,
    policy: &'a str,
    status: &'static str,
    inputs: &'a [Value],
    #[serde(skip_serializing_if = "Option::is_none")]
    outcomes: Option<&'a RunOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<&'a RunFailure>,
}

impl<'a> JsonReport<'a> {
    #[must_use]
    pub fn new(table: &'a ResultTable) -> Self {
        let rows = table
            .rows()
            .iter()
            .map(|row| JsonRow {
                run_id: row.run_id().0,
                scenario: row.scenario(),
                policy: row.policy(),
                status: match row.failure() {
                    None => "ok",
                    Some(failure) => failure.reason.as_str(),
                },
                inputs: row.inputs(),
                outcomes: row.output(),
                failure: row.failure(),
            })
            .collect();
        Self {
            dimensions: table.dimensions().iter().map(|d| d.name()).collect(),
            outcome_columns: table.outcome_columns(),
            rows,
            clusters: None,
            scores: None,
        }
    }

    #[must_use]
    pub fn with_clusters(mut self, clusters: &'a ClusterAssignment) -> Self {
        self.clusters = Some(clusters);
        self
    }

    #[must_use]
    pub fn with_scores(mut self, scores: &'a FeatureScoreMatrix) -> Self {
        self.scores = Some(scores);
        self
    }
}

pub fn write_json(report: &JsonReport<'_>, path: &Path) -> color_eyre::Result<()> {
    fs::write(path, serde_json::to_string_pretty(report)?)?;
    Ok(())
}

/// Per-outcome count/mean/std/min/max over completed runs, plus batch
/// counters.
#[must_use]
pub fn render_summary(table: &ResultTable, stats: &BatchStats) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} runs: {} completed, {} failed, {} skipped in {:.2?}\n\n",
        table.len(),
        stats.completed,
        stats.failed,
        stats.skipped,
        stats.elapsed
    ));

    out.push_str(&format!(
        "{:<28} {:>6} {:>14} {:>14} {:>14} {:>14}\n",
        "outcome", "count", "mean", "std", "min", "max"
    ));
    for column in table.outcome_columns() {
        let values: Vec<f64> = table
            .completed_rows()
            .filter_map(|row| row.outcome(column).and_then(OutcomeValue::as_scalar))
            .collect();
        if values.is_empty() {
            out.push_str(&format!("{column:<28} (no scalar values)\n"));
            continue;
        }
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let var: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        let std = if count > 1 {
            (var / (count as f64 - 1.0)).sqrt()
        } else {
            0.0
        };
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        out.push_str(&format!(
            "{column:<28} {count:>6} {mean:>14.3} {std:>14.3} {min:>14.3} {max:>14.3}\n"
        ));
    }

    out
}

/// One block per cluster: size, exemplar run, outcome centroid, and the mean
/// encoded input profile of the members.
#[must_use]
pub fn render_clusters(assignment: &ClusterAssignment) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} clusters over [{}]\n",
        assignment.clusters.len(),
        assignment.outcome_columns.join(", ")
    ));

    for (index, cluster) in assignment.clusters.iter().enumerate() {
        out.push_str(&format!(
            "\ncluster {index}: {} runs, exemplar run {}\n",
            cluster.size, cluster.exemplar.0
        ));

        out.push_str("  centroid:");
        for (name, value) in assignment.outcome_columns.iter().zip(&cluster.centroid) {
            out.push_str(&format!("  {name}={value:.3}"));
        }
        out.push('\n');

        out.push_str("  inputs:  ");
        for (name, mean) in &cluster.input_means {
            out.push_str(&format!("  {name}={mean:.3}"));
        }
        out.push('\n');
    }

    out
}

/// Ranked input influence per outcome column.
#[must_use]
pub fn render_scores(matrix: &FeatureScoreMatrix) -> String {
    let mut out = String::new();
    out.push_str("input influence per outcome (share of variance explained)\n");

    for outcome in matrix.outcomes() {
        let Some(ranked) = matrix.ranked(outcome) else {
            continue;
        };
        out.push_str(&format!("\n{outcome}:\n"));
        for (input, score) in ranked {
            out.push_str(&format!("  {input:<24} {score:>7.3}\n"));
        }
    }

    out
}
