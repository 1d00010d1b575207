//! Fully-bound points in uncertainty or lever space.
//!
//! [`Scenario`] and [`Policy`] are immutable once constructed and can only be
//! built through [`PointBuilder`], which validates the supplied values
//! against a declared dimension set: every dimension must be bound, unknown
//! names are rejected, and each value must lie in its dimension's domain.
//! Arbitrary key/value maps never cross this boundary unchecked.

use serde::{Deserialize, Serialize};

use crate::error::DesignError;

use super::{Dimension, Value};

/// One fully-bound point in uncertainty space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    name: String,
    values: Vec<(String, Value)>,
}

impl Scenario {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up the bound value for a dimension.
    #[must_use]
    pub fn value(&self, dimension: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == dimension)
            .map(|(_, v)| v)
    }

    /// Bound values in dimension declaration order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, v)| (name.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One fully-bound point in lever space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    name: String,
    values: Vec<(String, Value)>,
}

impl Policy {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up the bound value for a dimension.
    #[must_use]
    pub fn value(&self, dimension: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == dimension)
            .map(|(_, v)| v)
    }

    /// Bound values in dimension declaration order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, v)| (name.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Validating builder for [`Scenario`] and [`Policy`] points.
///
/// Values are accumulated unchecked and validated in one pass at build time,
/// so error reporting can name the first offending dimension.
#[derive(Debug)]
pub struct PointBuilder<'a> {
    dimensions: &'a [Dimension],
    name: String,
    pending: Vec<(String, Value)>,
}

impl<'a> PointBuilder<'a> {
    pub fn new(dimensions: &'a [Dimension], name: impl Into<String>) -> Self {
        Self {
            dimensions,
            name: name.into(),
            pending: Vec::with_capacity(dimensions.len()),
        }
    }

    /// Bind a value to a dimension. A later binding for the same name
    /// replaces an earlier one.
    #[must_use]
    pub fn set(mut self, dimension: impl Into<String>, value: impl Into<Value>) -> Self {
        let dimension = dimension.into();
        let value = value.into();
        if let Some(slot) = self.pending.iter_mut().find(|(name, _)| *name == dimension) {
            slot.1 = value;
        } else {
            self.pending.push((dimension, value));
        }
        self
    }

    /// Finish as a scenario.
    pub fn scenario(self) -> Result<Scenario, DesignError> {
        let (name, values) = self.validate()?;
        Ok(Scenario { name, values })
    }

    /// Finish as a policy.
    pub fn policy(self) -> Result<Policy, DesignError> {
        let (name, values) = self.validate()?;
        Ok(Policy { name, values })
    }

    fn validate(self) -> Result<(String, Vec<(String, Value)>), DesignError> {
        let mut pending = self.pending;
        let mut values = Vec::with_capacity(self.dimensions.len());

        for dim in self.dimensions {
            let Some(idx) = pending.iter().position(|(name, _)| name == dim.name()) else {
                return Err(DesignError::MissingDimensionValue {
                    dimension: dim.name().to_string(),
                });
            };
            let (name, value) = pending.swap_remove(idx);
            if !dim.domain().contains(&value) {
                return Err(DesignError::ValueOutOfDomain {
                    dimension: name,
                    value: value.to_string(),
                });
            }
            values.push((name, value));
        }

        if let Some((name, _)) = pending.first() {
            return Err(DesignError::UnknownDimension {
                dimension: name.clone(),
            });
        }

        Ok((self.name, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DimensionKind;

    fn dims() -> Vec<Dimension> {
        vec![
            Dimension::continuous("bmax", DimensionKind::Uncertainty, 100.0, 200.0),
            Dimension::continuous("pfail", DimensionKind::Uncertainty, 0.0, 1.0),
        ]
    }

    #[test]
    fn test_builder_orders_values_by_declaration() {
        let dims = dims();
        let s = PointBuilder::new(&dims, "reference")
            .set("pfail", 0.5)
            .set("bmax", 175.0)
            .scenario()
            .unwrap();

        let names: Vec<&str> = s.values().map(|(name, _)| name).collect();
        assert_eq!(names, ["bmax", "pfail"], "order follows declaration, not insertion");
        assert_eq!(s.value("bmax"), Some(&Value::Real(175.0)));
    }

    #[test]
    fn test_builder_rejects_missing_dimension() {
        let dims = dims();
        let err = PointBuilder::new(&dims, "partial")
            .set("bmax", 150.0)
            .scenario()
            .unwrap_err();
        assert!(
            matches!(err, DesignError::MissingDimensionValue { ref dimension } if dimension == "pfail"),
            "got {err:?}"
        );
    }

    #[test]
    fn test_builder_rejects_unknown_dimension() {
        let dims = dims();
        let err = PointBuilder::new(&dims, "typo")
            .set("bmax", 150.0)
            .set("pfail", 0.5)
            .set("bmin", 1.0)
            .scenario()
            .unwrap_err();
        assert!(
            matches!(err, DesignError::UnknownDimension { ref dimension } if dimension == "bmin"),
            "got {err:?}"
        );
    }

    #[test]
    fn test_builder_rejects_out_of_domain_value() {
        let dims = dims();
        let err = PointBuilder::new(&dims, "outside")
            .set("bmax", 99.0)
            .set("pfail", 0.5)
            .scenario()
            .unwrap_err();
        assert!(
            matches!(err, DesignError::ValueOutOfDomain { ref dimension, .. } if dimension == "bmax"),
            "got {err:?}"
        );
    }

    #[test]
    fn test_later_binding_replaces_earlier() {
        let dims = dims();
        let s = PointBuilder::new(&dims, "override")
            .set("bmax", 120.0)
            .set("pfail", 0.5)
            .set("bmax", 180.0)
            .scenario()
            .unwrap();
        assert_eq!(s.value("bmax"), Some(&Value::Real(180.0)));
    }
}
