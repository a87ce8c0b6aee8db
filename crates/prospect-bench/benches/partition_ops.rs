//! Criterion micro-benchmarks for Voronoi partition generation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use prospect_bench::{random_grid, site_sample};
use prospect_grid::EdgeBehavior;
use prospect_voronoi::PartitionPolicy;

/// Benchmark: generate every policy over a 128x128 map with 32 sites.
fn bench_generate_128(c: &mut Criterion) {
    let graph = random_grid(128, EdgeBehavior::Wrap, 5);
    let sites = site_sample(&graph, 32, 13);

    let mut group = c.benchmark_group("partition_generate_128");
    for policy in PartitionPolicy::ALL {
        let mut partition = policy.build();
        group.bench_function(policy.name(), |b| {
            b.iter(|| {
                partition.generate(&graph, &sites);
                black_box(partition.sites().len());
            });
        });
    }
    group.finish();
}

/// Benchmark: `closest_to` over every cell of a generated partition.
fn bench_lookup_128(c: &mut Criterion) {
    let graph = random_grid(128, EdgeBehavior::Wrap, 5);
    let sites = site_sample(&graph, 32, 13);
    let mut partition = PartitionPolicy::default().build();
    partition.generate(&graph, &sites);

    c.bench_function("partition_lookup_128", |b| {
        b.iter(|| {
            for node in graph.nodes() {
                black_box(partition.closest_to(node.coordinate()));
            }
        });
    });
}

criterion_group!(benches, bench_generate_128, bench_lookup_128);
criterion_main!(benches);
