//! Exploratory experiment engine for simulation models
//!
//! This crate runs computational experiments over a model's uncertainty and
//! lever space and analyzes what comes back. It supports:
//! - Typed input dimensions (continuous, integer, categorical) with
//!   per-dimension reference values
//! - Latin hypercube and uniform sampling of scenarios and policies
//! - Full-factorial scenario x policy designs with stable run ids
//! - A parallel runner that contains model errors, panics, and timeouts to
//!   the run that caused them
//! - Provenance-keyed result tables that retain failed runs
//! - Scenario discovery via k-means clustering in outcome space
//! - Input sensitivity scoring via extremely randomized trees
//!
//! # Typical flow
//!
//! ```ignore
//! use whatif_core::{BatchConfig, ExperimentDesign, SampleOptions};
//! use whatif_core::sampling::{sample_levers, sample_uncertainties};
//! use whatif_core::evaluator::run_experiments;
//!
//! let options = SampleOptions::seeded(42);
//! let scenarios = sample_uncertainties(&model, 100, &options)?;
//! let policies = sample_levers(&model, 4, &options)?;
//! let design = ExperimentDesign::build(&model, scenarios, policies)?;
//! let batch = run_experiments(&model, &design, &BatchConfig::default(), None)?;
//! println!("{} runs completed", batch.stats.completed);
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod aggregate;
pub mod analysis;
pub mod error;
pub mod evaluator;
pub mod progress;
pub mod sampling;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use evaluator::{BatchConfig, BatchResult, BatchStats, BatchWarning, run_experiments};
pub use model::{Dimension, Domain, ExperimentDesign, Model, ResultTable, RunId, Value};
pub use progress::{BatchProgress, RunObserver};
pub use sampling::{SampleDesign, SampleOptions};
