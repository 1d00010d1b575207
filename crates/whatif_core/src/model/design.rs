//! The experiment design: every (scenario, policy) pair with a stable run id.

use serde::{Deserialize, Serialize};

use crate::error::DesignError;

use super::{Dimension, Model, Policy, Scenario, Value};

/// Identifier of one run within a study.
///
/// Run ids are assigned scenario-major: the outer loop walks scenarios, the
/// inner loop policies, zero-based. The mapping is stable, so output rows
/// can always be re-associated with the inputs that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub u32);

/// One fully-specified model invocation
#[derive(Debug, Clone, Copy)]
pub struct RunRequest<'a> {
    pub run_id: RunId,
    pub scenario: &'a Scenario,
    pub policy: &'a Policy,
}

/// The full cross product of scenarios and policies, plus the dimension
/// schema the points were validated against.
#[derive(Debug, Clone)]
pub struct ExperimentDesign {
    uncertainties: Vec<Dimension>,
    levers: Vec<Dimension>,
    scenarios: Vec<Scenario>,
    policies: Vec<Policy>,
}

impl ExperimentDesign {
    /// Build a design from sampled points.
    ///
    /// Rejects empty scenario or policy sets with `EmptyDesign` (a
    /// degenerate design carries no information and is a caller bug), and
    /// re-checks that every point binds the model's declared dimensions in
    /// declaration order, so downstream joins can rely on a total, aligned
    /// input schema.
    pub fn build<M: Model + ?Sized>(
        model: &M,
        scenarios: Vec<Scenario>,
        policies: Vec<Policy>,
    ) -> Result<Self, DesignError> {
        if scenarios.is_empty() || policies.is_empty() {
            return Err(DesignError::EmptyDesign {
                scenarios: scenarios.len(),
                policies: policies.len(),
            });
        }

        let uncertainties = model.uncertainties().to_vec();
        let levers = model.levers().to_vec();

        for scenario in &scenarios {
            check_alignment(&uncertainties, scenario.values())?;
        }
        for policy in &policies {
            check_alignment(&levers, policy.values())?;
        }

        Ok(Self {
            uncertainties,
            levers,
            scenarios,
            policies,
        })
    }

    /// Total number of runs, `|scenarios| * |policies|`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len() * self.policies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        // Construction rejects empty sides, so a built design is never empty.
        self.scenarios.is_empty() || self.policies.is_empty()
    }

    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    #[must_use]
    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    #[must_use]
    pub fn uncertainties(&self) -> &[Dimension] {
        &self.uncertainties
    }

    #[must_use]
    pub fn levers(&self) -> &[Dimension] {
        &self.levers
    }

    /// All input dimensions, uncertainties first, then levers.
    pub fn dimensions(&self) -> impl Iterator<Item = &Dimension> {
        self.uncertainties.iter().chain(self.levers.iter())
    }

    /// Resolve a run id back to its (scenario, policy) pair.
    #[must_use]
    pub fn request(&self, run_id: RunId) -> Option<RunRequest<'_>> {
        let idx = run_id.0 as usize;
        if idx >= self.len() {
            return None;
        }
        let scenario = &self.scenarios[idx / self.policies.len()];
        let policy = &self.policies[idx % self.policies.len()];
        Some(RunRequest {
            run_id,
            scenario,
            policy,
        })
    }

    /// Iterate all run requests in run-id order.
    pub fn iter(&self) -> impl Iterator<Item = RunRequest<'_>> {
        self.scenarios
            .iter()
            .enumerate()
            .flat_map(move |(si, scenario)| {
                self.policies.iter().enumerate().map(move |(pi, policy)| {
                    let run_id = RunId((si * self.policies.len() + pi) as u32);
                    RunRequest {
                        run_id,
                        scenario,
                        policy,
                    }
                })
            })
    }
}

/// Verify a point's bound names match the dimension slice pairwise.
///
/// Points built through `PointBuilder` against the same model always pass;
/// this catches points smuggled in from a different schema.
fn check_alignment<'v>(
    dimensions: &[Dimension],
    mut values: impl Iterator<Item = (&'v str, &'v Value)>,
) -> Result<(), DesignError> {
    for dim in dimensions {
        match values.next() {
            Some((name, _)) if name == dim.name() => {}
            Some((name, _)) => {
                return Err(DesignError::UnknownDimension {
                    dimension: name.to_string(),
                });
            }
            None => {
                return Err(DesignError::MissingDimensionValue {
                    dimension: dim.name().to_string(),
                });
            }
        }
    }
    if let Some((name, _)) = values.next() {
        return Err(DesignError::UnknownDimension {
            dimension: name.to_string(),
        });
    }
    Ok(())
}
