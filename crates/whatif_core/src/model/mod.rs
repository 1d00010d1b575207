//! Data model for exploratory experiments.
//!
//! Dimensions declare the input space, scenarios and policies are validated
//! points in it, the experiment design is their cross product, and the
//! result table joins every run with what the model reported for it.

mod design;
mod dimension;
mod outcome;
mod point;
mod table;

pub use design::{ExperimentDesign, RunId, RunRequest};
pub use dimension::{Dimension, DimensionKind, Domain, Value};
pub use outcome::{
    FailureReason, Model, ModelError, OutcomeValue, RunContext, RunFailure, RunOutcome, RunOutput,
    RunPayload,
};
pub use point::{Policy, PointBuilder, Scenario};
pub use table::{ResultRow, ResultTable};
