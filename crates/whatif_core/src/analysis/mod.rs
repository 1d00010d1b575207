//! Post-batch analysis over assembled result tables.
//!
//! Both analyses read the table through its column accessors, so they see
//! completed runs only and share the same row alignment.

mod cluster;
mod scoring;

pub use cluster::{ClusterAssignment, ClusterConfig, ClusterProfile, cluster_outcomes};
pub use scoring::{FeatureScoreMatrix, ScoreConfig, score_inputs};
