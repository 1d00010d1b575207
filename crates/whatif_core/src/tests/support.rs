//! Shared fixtures for the engine tests

use crate::model::{
    Dimension, DimensionKind, Model, ModelError, Policy, RunContext, RunOutput, Scenario, Value,
};

type RunFn =
    Box<dyn Fn(&Scenario, &Policy, &RunContext) -> Result<RunOutput, ModelError> + Send + Sync>;

/// A model assembled from parts: fixed dimension lists plus a run closure.
pub struct StubModel {
    uncertainties: Vec<Dimension>,
    levers: Vec<Dimension>,
    outcomes: Vec<String>,
    run: RunFn,
}

impl StubModel {
    pub fn new(
        uncertainties: Vec<Dimension>,
        levers: Vec<Dimension>,
        outcomes: &[&str],
        run: impl Fn(&Scenario, &Policy, &RunContext) -> Result<RunOutput, ModelError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            uncertainties,
            levers,
            outcomes: outcomes.iter().map(|s| (*s).to_string()).collect(),
            run: Box::new(run),
        }
    }

    /// Two continuous uncertainties, one integer lever, one scalar outcome:
    /// `damage = bmax * pfail`. The lever is inert on purpose.
    pub fn flood() -> Self {
        Self::new(
            flood_uncertainties(),
            flood_levers(),
            &["damage"],
            |scenario, _policy, _ctx| {
                let bmax = scenario.value("bmax").unwrap().as_f64().unwrap();
                let pfail = scenario.value("pfail").unwrap().as_f64().unwrap();
                Ok(RunOutput::new().scalar("damage", bmax * pfail))
            },
        )
    }
}

impl Model for StubModel {
    fn uncertainties(&self) -> &[Dimension] {
        &self.uncertainties
    }

    fn levers(&self) -> &[Dimension] {
        &self.levers
    }

    fn outcomes(&self) -> &[String] {
        &self.outcomes
    }

    fn run(
        &self,
        scenario: &Scenario,
        policy: &Policy,
        ctx: &RunContext,
    ) -> Result<RunOutput, ModelError> {
        (self.run)(scenario, policy, ctx)
    }
}

pub fn flood_uncertainties() -> Vec<Dimension> {
    vec![
        Dimension::continuous("bmax", DimensionKind::Uncertainty, 100.0, 200.0),
        Dimension::continuous("pfail", DimensionKind::Uncertainty, 0.0, 1.0),
    ]
}

pub fn flood_levers() -> Vec<Dimension> {
    vec![Dimension::integer("rfr", DimensionKind::Lever, 0, 3)]
}

/// The do-nothing policy for the flood fixture.
pub fn zero_policy<M: Model + ?Sized>(model: &M) -> Policy {
    crate::sampling::reference_policy(model, "zero", &[("rfr", Value::Int(0))]).unwrap()
}
