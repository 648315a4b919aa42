//! Collapse engine benchmarks
//!
//! Grouping cost dominates post-processing of long experiments, so this
//! tracks the descriptor-hashing path for scalar and per-neuron payloads,
//! plus tuning-curve assembly.
//!
//! Run with: cargo bench --bench collapse

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use sintonia_db::{collapse, collapse_to_curves, StimulusDescriptor};

const CONDITIONS: usize = 20;
const NEURONS: usize = 50;

/// `trials` presentations of each of [`CONDITIONS`] orientations.
fn descriptors(trials: usize) -> Vec<StimulusDescriptor> {
    let mut all = Vec::with_capacity(CONDITIONS * trials);
    for trial in 0..trials {
        for condition in 0..CONDITIONS {
            all.push(
                StimulusDescriptor::builder("DriftingGrating")
                    .parameter("orientation", condition as f64 * 0.15)
                    .parameter("temporal_frequency", 2.0)
                    .parameter("contrast", 0.8)
                    .parameter("trial", trial as i64)
                    .build(),
            );
        }
    }
    all
}

/// Benchmark collapsing scalar values over the trial parameter
fn bench_collapse_scalars(c: &mut Criterion) {
    let mut group = c.benchmark_group("collapse_scalars");

    for trials in [5usize, 50, 500] {
        let stimuli = descriptors(trials);
        let presentations = stimuli.len();
        group.bench_with_input(
            BenchmarkId::new("by_trial", presentations),
            &stimuli,
            |b, stimuli| {
                b.iter_batched(
                    || (0..stimuli.len()).map(|i| i as f64).collect::<Vec<f64>>(),
                    |values| collapse(black_box(values), stimuli, &["trial"], false).unwrap(),
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

/// Benchmark collapsing per-neuron rate vectors over the trial parameter
fn bench_collapse_per_neuron(c: &mut Criterion) {
    let mut group = c.benchmark_group("collapse_per_neuron");

    for trials in [5usize, 50] {
        let stimuli = descriptors(trials);
        let presentations = stimuli.len();
        let rates: Vec<Vec<f64>> = (0..presentations)
            .map(|i| (0..NEURONS).map(|n| (i * n) as f64).collect())
            .collect();
        group.bench_with_input(
            BenchmarkId::new("by_trial", presentations),
            &(stimuli, rates),
            |b, (stimuli, rates)| {
                b.iter_batched(
                    || rates.clone(),
                    |values| collapse(black_box(values), stimuli, &["trial"], false).unwrap(),
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

/// Benchmark tuning-curve assembly over one varied parameter
fn bench_collapse_to_curves(c: &mut Criterion) {
    let mut group = c.benchmark_group("collapse_to_curves");

    for trials in [5usize, 50, 500] {
        let stimuli = descriptors(trials);
        let presentations = stimuli.len();
        group.bench_with_input(
            BenchmarkId::new("by_orientation", presentations),
            &stimuli,
            |b, stimuli| {
                b.iter_batched(
                    || (0..stimuli.len()).map(|i| i as f64).collect::<Vec<f64>>(),
                    |values| {
                        collapse_to_curves(black_box(values), stimuli, "orientation").unwrap()
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_collapse_scalars,
    bench_collapse_per_neuron,
    bench_collapse_to_curves
);
criterion_main!(benches);
