//! K-means clustering of completed runs in outcome space.
//!
//! Groups runs by where they land on the selected outcome columns, then
//! characterizes each group by its outcome centroid, an exemplar run, and
//! the mean encoded input profile of its members. Seeding is k-means++
//! from a caller-supplied seed, so the same table and config always yield
//! the same partition.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::Serialize;

use crate::error::AnalysisError;
use crate::model::{ResultTable, RunId};

/// Configuration for one clustering pass
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Number of clusters
    pub k: usize,
    /// Seed for centroid initialization
    pub seed: u64,
    /// Z-score each outcome column before measuring distance, so columns
    /// on different scales contribute evenly. Constant columns contribute
    /// nothing.
    pub standardize: bool,
    /// Iteration cap for the assign/update loop
    pub max_iter: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            k: 3,
            seed: 0,
            standardize: true,
            max_iter: 100,
        }
    }
}

/// One discovered cluster
#[derive(Debug, Clone, Serialize)]
pub struct ClusterProfile {
    /// Member count
    pub size: usize,
    /// Mean outcome vector in original units, aligned with the selected
    /// outcome columns
    pub centroid: Vec<f64>,
    /// Member run closest to the centroid
    pub exemplar: RunId,
    /// Mean encoded value per input dimension over the members
    pub input_means: Vec<(String, f64)>,
}

/// A full partition of the completed runs
#[derive(Debug, Clone, Serialize)]
pub struct ClusterAssignment {
    /// Outcome columns the distance was measured on
    pub outcome_columns: Vec<String>,
    /// Cluster index per completed run, ascending run id
    pub labels: Vec<(RunId, usize)>,
    pub clusters: Vec<ClusterProfile>,
}

/// Partition the completed runs of a table into `k` clusters by their
/// values on the selected outcome columns.
///
/// Failed runs are excluded. Errors if a column is unknown, non-scalar, or
/// absent from some completed run, or if `k` is zero or exceeds the number
/// of completed runs.
pub fn cluster_outcomes(
    table: &ResultTable,
    outcome_columns: &[&str],
    config: &ClusterConfig,
) -> Result<ClusterAssignment, AnalysisError> {
    if outcome_columns.is_empty() {
        return Err(AnalysisError::EmptySelection);
    }

    // Column extraction walks completed rows in ascending run id order, so
    // successfully extracted columns are index-aligned with each other.
    let mut columns: Vec<Vec<(RunId, f64)>> = Vec::with_capacity(outcome_columns.len());
    for name in outcome_columns {
        columns.push(table.scalar_outcome(name)?);
    }
    let rows = columns[0].len();
    if rows == 0 {
        return Err(AnalysisError::NoCompletedRuns);
    }
    if config.k == 0 || config.k > rows {
        return Err(AnalysisError::InvalidClusterCount { k: config.k, rows });
    }

    let run_ids: Vec<RunId> = columns[0].iter().map(|(id, _)| *id).collect();
    let dims = columns.len();
    let mut points: Vec<Vec<f64>> = (0..rows)
        .map(|i| columns.iter().map(|c| c[i].1).collect())
        .collect();

    // Offsets and scales stay identity when standardization is off, so the
    // de-standardization of centroids below is unconditional.
    let mut offsets = vec![0.0; dims];
    let mut scales = vec![1.0; dims];
    if config.standardize {
        for j in 0..dims {
            let mean = points.iter().map(|p| p[j]).sum::<f64>() / rows as f64;
            let var = points.iter().map(|p| (p[j] - mean).powi(2)).sum::<f64>() / rows as f64;
            offsets[j] = mean;
            if var > 0.0 {
                scales[j] = var.sqrt();
            }
        }
        for p in &mut points {
            for j in 0..dims {
                p[j] = (p[j] - offsets[j]) / scales[j];
            }
        }
    }

    let mut rng = SmallRng::seed_from_u64(config.seed);
    let mut centroids = seed_centroids(&points, config.k, &mut rng);

    let mut labels = vec![0usize; rows];
    for _ in 0..config.max_iter {
        let mut changed = false;
        for (i, p) in points.iter().enumerate() {
            let nearest = nearest_centroid(p, &centroids);
            if labels[i] != nearest {
                labels[i] = nearest;
                changed = true;
            }
        }

        let mut sums = vec![vec![0.0; dims]; config.k];
        let mut counts = vec![0usize; config.k];
        for (i, p) in points.iter().enumerate() {
            counts[labels[i]] += 1;
            for j in 0..dims {
                sums[labels[i]][j] += p[j];
            }
        }
        for c in 0..config.k {
            if counts[c] > 0 {
                for j in 0..dims {
                    centroids[c][j] = sums[c][j] / counts[c] as f64;
                }
            } else {
                // Reseed an empty cluster from the worst-fitting point and
                // keep iterating.
                let far = farthest_point(&points, &centroids, &labels);
                centroids[c] = points[far].clone();
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }

    // Sync labels to the final centroids, then make sure no cluster ends
    // empty by stealing the worst-fitting point from a multi-member one.
    for (i, p) in points.iter().enumerate() {
        labels[i] = nearest_centroid(p, &centroids);
    }
    let mut counts = vec![0usize; config.k];
    for &label in &labels {
        counts[label] += 1;
    }
    for c in 0..config.k {
        if counts[c] == 0 {
            let mut far = 0;
            let mut far_dist = -1.0;
            for (i, p) in points.iter().enumerate() {
                if counts[labels[i]] > 1 {
                    let dist = distance2(p, &centroids[labels[i]]);
                    if dist > far_dist {
                        far_dist = dist;
                        far = i;
                    }
                }
            }
            counts[labels[far]] -= 1;
            labels[far] = c;
            counts[c] = 1;
        }
    }

    // Encoded input columns share the completed-row alignment of the
    // outcome columns extracted above.
    let mut input_columns: Vec<(String, Vec<(RunId, f64)>)> = Vec::new();
    for dimension in table.dimensions() {
        let encoded = table.encoded_input(dimension.name())?;
        input_columns.push((dimension.name().to_string(), encoded));
    }

    let mut clusters = Vec::with_capacity(config.k);
    for c in 0..config.k {
        let members: Vec<usize> = (0..rows).filter(|&i| labels[i] == c).collect();

        let mut exemplar = members[0];
        let mut best = f64::INFINITY;
        for &i in &members {
            let dist = distance2(&points[i], &centroids[c]);
            if dist < best {
                best = dist;
                exemplar = i;
            }
        }

        let centroid: Vec<f64> = centroids[c]
            .iter()
            .enumerate()
            .map(|(j, &z)| z * scales[j] + offsets[j])
            .collect();

        let input_means: Vec<(String, f64)> = input_columns
            .iter()
            .map(|(name, encoded)| {
                let sum: f64 = members.iter().map(|&i| encoded[i].1).sum();
                (name.clone(), sum / members.len() as f64)
            })
            .collect();

        clusters.push(ClusterProfile {
            size: members.len(),
            centroid,
            exemplar: run_ids[exemplar],
            input_means,
        });
    }

    Ok(ClusterAssignment {
        outcome_columns: outcome_columns.iter().map(|s| (*s).to_string()).collect(),
        labels: run_ids.iter().copied().zip(labels).collect(),
        clusters,
    })
}

/// K-means++ seeding: first centroid uniform, the rest weighted by squared
/// distance to the nearest centroid chosen so far.
fn seed_centroids(points: &[Vec<f64>], k: usize, rng: &mut SmallRng) -> Vec<Vec<f64>> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.random_range(0..points.len())].clone());
    while centroids.len() < k {
        let weights: Vec<f64> = points
            .iter()
            .map(|p| {
                centroids
                    .iter()
                    .map(|c| distance2(p, c))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = weights.iter().sum();
        let pick = if total > 0.0 {
            let mut target = rng.random::<f64>() * total;
            let mut pick = points.len() - 1;
            for (i, &w) in weights.iter().enumerate() {
                target -= w;
                if target <= 0.0 {
                    pick = i;
                    break;
                }
            }
            pick
        } else {
            // All points coincide with a centroid already.
            rng.random_range(0..points.len())
        };
        centroids.push(points[pick].clone());
    }
    centroids
}

fn nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut nearest = 0;
    let mut best = f64::INFINITY;
    for (c, centroid) in centroids.iter().enumerate() {
        let dist = distance2(point, centroid);
        if dist < best {
            best = dist;
            nearest = c;
        }
    }
    nearest
}

fn farthest_point(points: &[Vec<f64>], centroids: &[Vec<f64>], labels: &[usize]) -> usize {
    let mut far = 0;
    let mut far_dist = -1.0;
    for (i, p) in points.iter().enumerate() {
        let dist = distance2(p, &centroids[labels[i]]);
        if dist > far_dist {
            far_dist = dist;
            far = i;
        }
    }
    far
}

fn distance2(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}
