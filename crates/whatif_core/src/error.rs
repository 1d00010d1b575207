use std::fmt;

use crate::model::RunId;

/// Errors raised while declaring, sampling, or assembling an experiment design
#[derive(Debug, Clone)]
pub enum DesignError {
    /// A supplied assignment omits a declared dimension
    MissingDimensionValue { dimension: String },
    /// A supplied assignment names a dimension the model never declared
    UnknownDimension { dimension: String },
    /// A bound value falls outside its dimension's declared domain
    ValueOutOfDomain { dimension: String, value: String },
    /// Zero scenarios or zero policies handed to design construction
    EmptyDesign { scenarios: usize, policies: usize },
}

impl fmt::Display for DesignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesignError::MissingDimensionValue { dimension } => {
                write!(f, "no value supplied for dimension '{dimension}'")
            }
            DesignError::UnknownDimension { dimension } => {
                write!(f, "dimension '{dimension}' is not declared by the model")
            }
            DesignError::ValueOutOfDomain { dimension, value } => {
                write!(f, "value {value} is outside the domain of dimension '{dimension}'")
            }
            DesignError::EmptyDesign {
                scenarios,
                policies,
            } => {
                write!(
                    f,
                    "experiment design needs at least one scenario and one policy \
                     (got {scenarios} scenarios, {policies} policies)"
                )
            }
        }
    }
}

impl std::error::Error for DesignError {}

/// Errors raised while joining run outcomes back onto a design
#[derive(Debug, Clone)]
pub enum AggregationError {
    /// A run id in the design has no matching outcome
    IncompleteResultSet { run_id: RunId },
    /// Two outcomes claim the same run id
    DuplicateOutcome { run_id: RunId },
    /// An outcome carries a run id outside the design
    UnknownRunId { run_id: RunId },
}

impl fmt::Display for AggregationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationError::IncompleteResultSet { run_id } => {
                write!(f, "run {} has no outcome", run_id.0)
            }
            AggregationError::DuplicateOutcome { run_id } => {
                write!(f, "run {} has more than one outcome", run_id.0)
            }
            AggregationError::UnknownRunId { run_id } => {
                write!(f, "outcome for run {} which is not in the design", run_id.0)
            }
        }
    }
}

impl std::error::Error for AggregationError {}

/// Errors raised by the batch runner
#[derive(Debug, Clone)]
pub enum BatchError {
    /// Not a single run in the batch produced an output
    AllRunsFailed { failed: usize },
    /// The outcome join failed while assembling the result table
    Aggregation(AggregationError),
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::AllRunsFailed { failed } => {
                write!(f, "all {failed} runs in the batch failed")
            }
            BatchError::Aggregation(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchError::Aggregation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AggregationError> for BatchError {
    fn from(e: AggregationError) -> Self {
        BatchError::Aggregation(e)
    }
}

/// Errors raised by the analysis passes (clustering, feature scoring)
#[derive(Debug, Clone)]
pub enum AnalysisError {
    /// A requested column is neither an input dimension nor an outcome
    UnknownColumn { column: String },
    /// A requested outcome column holds series values, not scalars
    NonScalarColumn { column: String },
    /// A completed row is missing a value in a requested column
    MissingValue { column: String, run_id: RunId },
    /// Every row in the table is failure-marked
    NoCompletedRuns,
    /// Cluster count outside [1, completed rows]
    InvalidClusterCount { k: usize, rows: usize },
    /// An empty column selection was supplied
    EmptySelection,
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::UnknownColumn { column } => {
                write!(f, "column '{column}' is not in the result table")
            }
            AnalysisError::NonScalarColumn { column } => {
                write!(f, "column '{column}' holds series values, expected scalars")
            }
            AnalysisError::MissingValue { column, run_id } => {
                write!(f, "run {} has no value in column '{column}'", run_id.0)
            }
            AnalysisError::NoCompletedRuns => {
                write!(f, "result table has no completed rows to analyze")
            }
            AnalysisError::InvalidClusterCount { k, rows } => {
                write!(f, "cluster count {k} outside valid range [1, {rows}]")
            }
            AnalysisError::EmptySelection => {
                write!(f, "at least one column must be selected")
            }
        }
    }
}

impl std::error::Error for AnalysisError {}
