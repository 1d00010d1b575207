//! Input dimensions: the typed axes of an experiment space.
//!
//! A model declares its inputs once, as a set of named [`Dimension`]s tagged
//! either [`DimensionKind::Uncertainty`] (sampled to explore risk) or
//! [`DimensionKind::Lever`] (a controllable policy choice). Dimensions are
//! immutable for the lifetime of a study; every scenario/policy point is
//! validated against them before any model invocation.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Whether a dimension is sampled over or chosen by the decision-maker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DimensionKind {
    /// An input the decision-maker does not control
    Uncertainty,
    /// An input representing a policy choice
    Lever,
}

/// The set of values a dimension can take
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Domain {
    /// Real interval `[low, high]`
    Continuous { low: f64, high: f64 },
    /// Integer range `[low, high]`, both ends inclusive
    Integer { low: i64, high: i64 },
    /// Finite set of named levels, in declared order
    Categorical { levels: Vec<String> },
}

impl Domain {
    /// Check whether a value is a member of this domain.
    ///
    /// A value of the wrong shape (e.g. a level against an integer range) is
    /// never a member.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        match (self, value) {
            (Domain::Continuous { low, high }, Value::Real(v)) => *v >= *low && *v <= *high,
            (Domain::Integer { low, high }, Value::Int(v)) => *v >= *low && *v <= *high,
            (Domain::Categorical { levels }, Value::Level(name)) => {
                levels.iter().any(|l| l == name)
            }
            _ => false,
        }
    }

    /// Draw one value uniformly from the domain.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        match self {
            Domain::Continuous { low, high } => Value::Real(rng.random_range(*low..=*high)),
            Domain::Integer { low, high } => Value::Int(rng.random_range(*low..=*high)),
            Domain::Categorical { levels } => {
                let idx = rng.random_range(0..levels.len());
                Value::Level(levels[idx].clone())
            }
        }
    }

    /// Number of distinct values, `None` for continuous domains.
    #[must_use]
    pub fn cardinality(&self) -> Option<usize> {
        match self {
            Domain::Continuous { .. } => None,
            Domain::Integer { low, high } => Some((high - low + 1).max(0) as usize),
            Domain::Categorical { levels } => Some(levels.len()),
        }
    }

    /// Numeric encoding used by the analysis passes.
    ///
    /// Real and integer values encode as themselves; categorical levels
    /// encode ordinally as their declared index. The encoding is the same
    /// during fitting and reporting. Returns `None` for a value that is not
    /// a member of the domain.
    #[must_use]
    pub fn encode(&self, value: &Value) -> Option<f64> {
        match (self, value) {
            (Domain::Continuous { .. }, Value::Real(v)) => Some(*v),
            (Domain::Integer { .. }, Value::Int(v)) => Some(*v as f64),
            (Domain::Categorical { levels }, Value::Level(name)) => {
                levels.iter().position(|l| l == name).map(|i| i as f64)
            }
            _ => None,
        }
    }
}

/// A single bound input value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Real(f64),
    Int(i64),
    Level(String),
}

impl Value {
    /// Numeric view: real values as-is, integers widened, levels `None`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::Level(_) => None,
        }
    }

    /// The level name for categorical values, `None` otherwise.
    #[must_use]
    pub fn as_level(&self) -> Option<&str> {
        match self {
            Value::Level(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Real(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Level(name) => write!(f, "{name}"),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Level(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Level(v)
    }
}

/// A named, typed axis of the experiment space.
///
/// Carries a reference value used when a caller wants to pin the dimension
/// to its nominal setting; constructors pick a sensible default (interval
/// midpoint, range low end, first level) which `with_reference` overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    name: String,
    kind: DimensionKind,
    domain: Domain,
    reference: Value,
}

impl Dimension {
    /// Declare a continuous dimension over `[low, high]`.
    pub fn continuous(name: impl Into<String>, kind: DimensionKind, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            kind,
            domain: Domain::Continuous { low, high },
            reference: Value::Real((low + high) / 2.0),
        }
    }

    /// Declare an integer dimension over `[low, high]` inclusive.
    pub fn integer(name: impl Into<String>, kind: DimensionKind, low: i64, high: i64) -> Self {
        Self {
            name: name.into(),
            kind,
            domain: Domain::Integer { low, high },
            reference: Value::Int(low),
        }
    }

    /// Declare a categorical dimension over the given levels.
    pub fn categorical<S: Into<String>>(
        name: impl Into<String>,
        kind: DimensionKind,
        levels: impl IntoIterator<Item = S>,
    ) -> Self {
        let levels: Vec<String> = levels.into_iter().map(Into::into).collect();
        let reference = Value::Level(levels.first().cloned().unwrap_or_default());
        Self {
            name: name.into(),
            kind,
            domain: Domain::Categorical { levels },
            reference,
        }
    }

    /// Override the reference value.
    #[must_use]
    pub fn with_reference(mut self, value: impl Into<Value>) -> Self {
        self.reference = value.into();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> DimensionKind {
        self.kind
    }

    #[must_use]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    #[must_use]
    pub fn reference(&self) -> &Value {
        &self.reference
    }
}
