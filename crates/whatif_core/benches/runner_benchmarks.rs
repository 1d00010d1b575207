//! Criterion benchmarks for the whatif_core experiment engine
//!
//! Run with: cargo bench -p whatif_core

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use whatif_core::analysis::{ClusterConfig, ScoreConfig, cluster_outcomes, score_inputs};
use whatif_core::evaluator::{BatchConfig, run_experiments};
use whatif_core::model::{
    Dimension, DimensionKind, ExperimentDesign, Model, ModelError, Policy, ResultTable,
    RunContext, RunOutput, Scenario, Value,
};
use whatif_core::sampling::{SampleOptions, sample_levers, sample_uncertainties};

/// Shallow lake eutrophication model: a few hundred floating-point steps
/// per run, enough to make scheduling overhead visible without drowning it.
struct LakeModel {
    uncertainties: Vec<Dimension>,
    levers: Vec<Dimension>,
    outcomes: Vec<String>,
}

impl LakeModel {
    fn new() -> Self {
        Self {
            uncertainties: vec![
                Dimension::continuous("inflow", DimensionKind::Uncertainty, 0.01, 0.2),
                Dimension::continuous("removal", DimensionKind::Uncertainty, 0.1, 0.5),
                Dimension::continuous("recycling", DimensionKind::Uncertainty, 2.0, 4.5),
            ],
            levers: vec![Dimension::continuous(
                "release",
                DimensionKind::Lever,
                0.0,
                0.1,
            )],
            outcomes: vec!["peak_phosphorus".to_string(), "reliability".to_string()],
        }
    }
}

impl Model for LakeModel {
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
        _ctx: &RunContext,
    ) -> Result<RunOutput, ModelError> {
        let value = |point: Option<&Value>, name: &str| {
            point
                .and_then(Value::as_f64)
                .ok_or_else(|| ModelError::new(format!("missing input '{name}'")))
        };
        let inflow = value(scenario.value("inflow"), "inflow")?;
        let removal = value(scenario.value("removal"), "removal")?;
        let recycling = value(scenario.value("recycling"), "recycling")?;
        let release = value(policy.value("release"), "release")?;

        let steps = 100;
        let mut x: f64 = 0.0;
        let mut peak: f64 = 0.0;
        let mut below = 0usize;
        for _ in 0..steps {
            let recycled = x.powf(recycling) / (1.0 + x.powf(recycling));
            x = x + inflow + release + recycled - removal * x;
            peak = peak.max(x);
            if x < 1.0 {
                below += 1;
            }
        }

        Ok(RunOutput::new()
            .scalar("peak_phosphorus", peak)
            .scalar("reliability", below as f64 / steps as f64))
    }
}

fn lake_design(model: &LakeModel, scenarios: usize, policies: usize) -> ExperimentDesign {
    let sampled =
        sample_uncertainties(model, scenarios, &SampleOptions::seeded(42)).expect("sampling");
    let levers = sample_levers(model, policies, &SampleOptions::seeded(43)).expect("sampling");
    ExperimentDesign::build(model, sampled, levers).expect("design")
}

fn lake_table(model: &LakeModel, scenarios: usize) -> ResultTable {
    let design = lake_design(model, scenarios, 2);
    run_experiments(model, &design, &BatchConfig::default(), None)
        .expect("batch")
        .table
}

fn bench_sampling(c: &mut Criterion) {
    let model = LakeModel::new();
    let options = SampleOptions::seeded(42);

    c.bench_function("latin_hypercube_1000", |b| {
        b.iter(|| sample_uncertainties(black_box(&model), black_box(1000), black_box(&options)))
    });
}

fn bench_batch_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_experiments");
    let model = LakeModel::new();

    for scenarios in [50, 250, 500].iter() {
        let design = lake_design(&model, *scenarios, 2);
        let config = BatchConfig::default();

        group.bench_with_input(BenchmarkId::new("runs", design.len()), scenarios, |b, _| {
            b.iter(|| run_experiments(black_box(&model), black_box(&design), &config, None))
        });
    }

    group.finish();
}

fn bench_worker_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("worker_scaling");
    let model = LakeModel::new();
    let design = lake_design(&model, 250, 2);

    for workers in [1usize, 2, 4, 8].iter() {
        let config = BatchConfig {
            workers: *workers,
            ..BatchConfig::default()
        };

        group.bench_with_input(BenchmarkId::new("workers", workers), workers, |b, _| {
            b.iter(|| run_experiments(black_box(&model), black_box(&design), &config, None))
        });
    }

    group.finish();
}

fn bench_analysis(c: &mut Criterion) {
    let model = LakeModel::new();
    let table = lake_table(&model, 250);

    let cluster_config = ClusterConfig {
        k: 3,
        ..ClusterConfig::default()
    };
    c.bench_function("cluster_500_rows", |b| {
        b.iter(|| {
            cluster_outcomes(
                black_box(&table),
                black_box(&["peak_phosphorus", "reliability"]),
                &cluster_config,
            )
        })
    });

    let score_config = ScoreConfig {
        trees: 50,
        ..ScoreConfig::default()
    };
    c.bench_function("score_500_rows", |b| {
        b.iter(|| {
            score_inputs(
                black_box(&table),
                black_box(&["inflow", "removal", "recycling", "release"]),
                black_box(&["peak_phosphorus"]),
                &score_config,
            )
        })
    });
}

criterion_group!(
    benches,
    bench_sampling,
    bench_batch_sizes,
    bench_worker_scaling,
    bench_analysis,
);
criterion_main!(benches);
