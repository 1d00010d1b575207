//! Input sensitivity scoring with extremely randomized trees.
//!
//! Fits a small forest of regression trees per outcome column: every tree
//! sees the full sample, each split draws a random threshold per candidate
//! feature and keeps the one with the best variance reduction. A feature's
//! score is its accumulated variance reduction over the forest, normalized
//! to sum to one per outcome. Scores measure association, not causation,
//! but rank which inputs move an outcome most.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::Serialize;

use crate::error::AnalysisError;
use crate::model::ResultTable;

/// Configuration for one scoring pass
#[derive(Debug, Clone)]
pub struct ScoreConfig {
    /// Trees per outcome column
    pub trees: usize,
    /// Depth cap per tree, unbounded when `None`
    pub max_depth: Option<usize>,
    /// Minimum node size eligible for splitting
    pub min_samples_split: usize,
    /// Fraction of input columns drawn as split candidates at each node
    pub feature_fraction: f64,
    /// Seed; outcome column `i` scores with `seed + i`
    pub seed: u64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            trees: 100,
            max_depth: None,
            min_samples_split: 2,
            feature_fraction: 1.0,
            seed: 0,
        }
    }
}

/// Scores for every (input, outcome) pair, each outcome column summing to
/// one unless that outcome was constant.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureScoreMatrix {
    inputs: Vec<String>,
    outcomes: Vec<String>,
    /// Indexed `[input][outcome]`
    scores: Vec<Vec<f64>>,
}

impl FeatureScoreMatrix {
    #[must_use]
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    #[must_use]
    pub fn outcomes(&self) -> &[String] {
        &self.outcomes
    }

    #[must_use]
    pub fn get(&self, input: &str, outcome: &str) -> Option<f64> {
        let i = self.inputs.iter().position(|n| n == input)?;
        let o = self.outcomes.iter().position(|n| n == outcome)?;
        Some(self.scores[i][o])
    }

    /// Scores of every input against one outcome, in input order.
    #[must_use]
    pub fn column(&self, outcome: &str) -> Option<Vec<(&str, f64)>> {
        let o = self.outcomes.iter().position(|n| n == outcome)?;
        Some(
            self.inputs
                .iter()
                .enumerate()
                .map(|(i, name)| (name.as_str(), self.scores[i][o]))
                .collect(),
        )
    }

    /// Scores of every input against one outcome, most influential first.
    #[must_use]
    pub fn ranked(&self, outcome: &str) -> Option<Vec<(&str, f64)>> {
        let mut column = self.column(outcome)?;
        column.sort_by(|a, b| b.1.total_cmp(&a.1));
        Some(column)
    }
}

/// Score how strongly each input column drives each outcome column.
///
/// Inputs are read through their encoded view, outcomes must be scalar.
/// Only completed runs contribute. The same table, selection, and config
/// always produce the same matrix.
pub fn score_inputs(
    table: &ResultTable,
    input_columns: &[&str],
    outcome_columns: &[&str],
    config: &ScoreConfig,
) -> Result<FeatureScoreMatrix, AnalysisError> {
    if input_columns.is_empty() || outcome_columns.is_empty() {
        return Err(AnalysisError::EmptySelection);
    }

    let mut features: Vec<Vec<f64>> = Vec::with_capacity(input_columns.len());
    for name in input_columns {
        let encoded = table.encoded_input(name)?;
        features.push(encoded.into_iter().map(|(_, v)| v).collect());
    }
    let rows = features[0].len();
    if rows == 0 {
        return Err(AnalysisError::NoCompletedRuns);
    }

    let candidates = ((config.feature_fraction * features.len() as f64).floor() as usize)
        .clamp(1, features.len());

    let mut scores = vec![vec![0.0; outcome_columns.len()]; input_columns.len()];
    for (o, name) in outcome_columns.iter().enumerate() {
        let target: Vec<f64> = table
            .scalar_outcome(name)?
            .into_iter()
            .map(|(_, v)| v)
            .collect();

        let mut rng = SmallRng::seed_from_u64(config.seed.wrapping_add(o as u64));
        let mut importance = vec![0.0; features.len()];
        let mut indices: Vec<usize> = (0..rows).collect();
        for _ in 0..config.trees {
            grow_tree(
                &features,
                &target,
                &mut indices,
                0,
                candidates,
                config,
                &mut rng,
                &mut importance,
            );
        }

        // A constant outcome accumulates nothing and scores all-zero
        // rather than dividing by zero.
        let total: f64 = importance.iter().sum();
        if total > 0.0 {
            for (i, value) in importance.iter().enumerate() {
                scores[i][o] = value / total;
            }
        }
    }

    Ok(FeatureScoreMatrix {
        inputs: input_columns.iter().map(|s| (*s).to_string()).collect(),
        outcomes: outcome_columns.iter().map(|s| (*s).to_string()).collect(),
        scores,
    })
}

/// One extremely randomized regression tree, grown by partitioning the
/// index slice in place. Split gains are charged to `importance` as they
/// are found; the tree itself is never materialized.
#[allow(clippy::too_many_arguments)]
fn grow_tree(
    features: &[Vec<f64>],
    target: &[f64],
    indices: &mut [usize],
    depth: usize,
    candidates: usize,
    config: &ScoreConfig,
    rng: &mut SmallRng,
    importance: &mut [f64],
) {
    if indices.len() < config.min_samples_split {
        return;
    }
    if let Some(max_depth) = config.max_depth
        && depth >= max_depth
    {
        return;
    }
    let sse = node_sse(target, indices);
    if sse <= 1e-12 {
        return;
    }

    let mut best: Option<(usize, f64, f64)> = None;
    for f in rand::seq::index::sample(rng, features.len(), candidates) {
        let column = &features[f];
        let mut low = f64::INFINITY;
        let mut high = f64::NEG_INFINITY;
        for &i in indices.iter() {
            low = low.min(column[i]);
            high = high.max(column[i]);
        }
        if high <= low {
            continue;
        }

        // Random threshold in [low, high): both sides are guaranteed
        // non-empty under a `<=` split.
        let threshold = rng.random_range(low..high);
        let mut left = (0usize, 0.0, 0.0);
        let mut right = (0usize, 0.0, 0.0);
        for &i in indices.iter() {
            let side = if column[i] <= threshold {
                &mut left
            } else {
                &mut right
            };
            side.0 += 1;
            side.1 += target[i];
            side.2 += target[i] * target[i];
        }
        let reduction = sse - side_sse(left) - side_sse(right);
        if reduction > 0.0 && best.is_none_or(|(_, _, r)| reduction > r) {
            best = Some((f, threshold, reduction));
        }
    }

    let Some((feature, threshold, reduction)) = best else {
        return;
    };
    importance[feature] += reduction;

    let column = &features[feature];
    let split = partition_indices(indices, |i| column[i] <= threshold);
    let (left, right) = indices.split_at_mut(split);
    grow_tree(
        features, target, left, depth + 1, candidates, config, rng, importance,
    );
    grow_tree(
        features, target, right, depth + 1, candidates, config, rng, importance,
    );
}

fn node_sse(target: &[f64], indices: &[usize]) -> f64 {
    let mean = indices.iter().map(|&i| target[i]).sum::<f64>() / indices.len() as f64;
    indices.iter().map(|&i| (target[i] - mean).powi(2)).sum()
}

fn side_sse((count, sum, sum2): (usize, f64, f64)) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (sum2 - sum * sum / count as f64).max(0.0)
}

/// In-place partition; returns the boundary index.
fn partition_indices(indices: &mut [usize], pred: impl Fn(usize) -> bool) -> usize {
    let mut split = 0;
    for i in 0..indices.len() {
        if pred(indices[i]) {
            indices.swap(split, i);
            split += 1;
        }
    }
    split
}
