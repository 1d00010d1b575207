//! Sample generation over declared dimensions.
//!
//! Continuous dimensions default to Latin hypercube stratification so even
//! small sample sets cover the interval; integer and categorical dimensions
//! are drawn uniformly over their finite sets. All draws run through a
//! single seeded generator in dimension declaration order, so a fixed seed
//! fixes the sample set bit for bit.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::DesignError;
use crate::model::{Dimension, Domain, Model, Policy, PointBuilder, Scenario, Value};

/// How randomized points are spread over the design space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleDesign {
    /// One draw per equal-probability stratum per continuous dimension,
    /// strata shuffled independently per dimension
    #[default]
    LatinHypercube,
    /// Independent uniform draws
    Uniform,
}

/// Options for randomized sampling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleOptions {
    /// Seed for the sample stream; `None` draws a fresh one per call.
    pub seed: Option<u64>,
    pub design: SampleDesign,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            seed: None,
            design: SampleDesign::LatinHypercube,
        }
    }
}

impl SampleOptions {
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}

/// Draw `n` scenarios over the model's uncertainty dimensions, named
/// `scenario_0` through `scenario_{n-1}`.
pub fn sample_uncertainties<M: Model + ?Sized>(
    model: &M,
    n: usize,
    options: &SampleOptions,
) -> Result<Vec<Scenario>, DesignError> {
    sample_builders(model.uncertainties(), n, options, "scenario")
        .into_iter()
        .map(PointBuilder::scenario)
        .collect()
}

/// Draw `n` policies over the model's lever dimensions, named `policy_0`
/// through `policy_{n-1}`.
pub fn sample_levers<M: Model + ?Sized>(
    model: &M,
    n: usize,
    options: &SampleOptions,
) -> Result<Vec<Policy>, DesignError> {
    sample_builders(model.levers(), n, options, "policy")
        .into_iter()
        .map(PointBuilder::policy)
        .collect()
}

/// Build the reference scenario: every uncertainty at its declared
/// reference value, with optional overrides on top.
pub fn reference_scenario<M: Model + ?Sized>(
    model: &M,
    name: &str,
    overrides: &[(&str, Value)],
) -> Result<Scenario, DesignError> {
    reference_builder(model.uncertainties(), name, overrides).scenario()
}

/// Build the reference policy: every lever at its declared reference value
/// (typically the do-nothing setting), with optional overrides on top.
pub fn reference_policy<M: Model + ?Sized>(
    model: &M,
    name: &str,
    overrides: &[(&str, Value)],
) -> Result<Policy, DesignError> {
    reference_builder(model.levers(), name, overrides).policy()
}

fn reference_builder<'a>(
    dimensions: &'a [Dimension],
    name: &str,
    overrides: &[(&str, Value)],
) -> PointBuilder<'a> {
    let mut builder = PointBuilder::new(dimensions, name);
    for dim in dimensions {
        builder = builder.set(dim.name(), dim.reference().clone());
    }
    for (dimension, value) in overrides {
        builder = builder.set(*dimension, value.clone());
    }
    builder
}

fn sample_builders<'a>(
    dimensions: &'a [Dimension],
    n: usize,
    options: &SampleOptions,
    prefix: &str,
) -> Vec<PointBuilder<'a>> {
    let seed = options.seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = SmallRng::seed_from_u64(seed);

    // Value columns drawn per dimension in declaration order, then
    // transposed into points.
    let columns: Vec<Vec<Value>> = dimensions
        .iter()
        .map(|dim| sample_column(dim, n, options.design, &mut rng))
        .collect();

    (0..n)
        .map(|i| {
            let mut builder = PointBuilder::new(dimensions, format!("{prefix}_{i}"));
            for (dim, column) in dimensions.iter().zip(&columns) {
                builder = builder.set(dim.name(), column[i].clone());
            }
            builder
        })
        .collect()
}

fn sample_column<R: Rng>(
    dim: &Dimension,
    n: usize,
    design: SampleDesign,
    rng: &mut R,
) -> Vec<Value> {
    match (design, dim.domain()) {
        (SampleDesign::LatinHypercube, Domain::Continuous { low, high }) => {
            let mut strata: Vec<f64> = (0..n)
                .map(|j| (j as f64 + rng.random::<f64>()) / n as f64)
                .collect();
            strata.shuffle(rng);
            strata
                .into_iter()
                .map(|u| Value::Real(low + u * (high - low)))
                .collect()
        }
        // Finite domains have no strata worth the name; uniform draws cover
        // them under either design.
        _ => (0..n).map(|_| dim.domain().sample(rng)).collect(),
    }
}
