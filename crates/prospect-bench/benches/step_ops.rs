//! Criterion benchmarks for whole simulation steps.

use criterion::{criterion_group, criterion_main, Criterion};
use prospect_bench::{reference_profile, stress_profile};
use prospect_engine::Simulation;

/// Benchmark: one step of the reference profile, after a 50-step warm-up.
fn bench_step_reference(c: &mut Criterion) {
    let mut sim = Simulation::new(reference_profile(42)).unwrap();
    for _ in 0..50 {
        sim.step();
    }
    c.bench_function("step_reference", |b| {
        b.iter(|| sim.step());
    });
}

/// Benchmark: one step of the stress profile.
fn bench_step_stress(c: &mut Criterion) {
    let mut sim = Simulation::new(stress_profile(42)).unwrap();
    for _ in 0..10 {
        sim.step();
    }
    let mut group = c.benchmark_group("step_stress");
    group.sample_size(20);
    group.bench_function("step", |b| {
        b.iter(|| sim.step());
    });
    group.finish();
}

criterion_group!(benches, bench_step_reference, bench_step_stress);
criterion_main!(benches);
