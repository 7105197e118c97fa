use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use graphqmf::amfs::Amfs;
use graphqmf::decomposition::DecompositionStrategy;
use graphqmf::graph::WeightedGraph;
use graphqmf::harary::Harary;
use rand::prelude::*;
use std::hint::black_box;
use std::time::Duration;

/// Ring plus random chords, weights in [0.5, 2)
fn generate_graph(n: usize, chord_prob: f64, seed: u64) -> WeightedGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut edges = Vec::new();
    for i in 0..n {
        edges.push((i, (i + 1) % n, rng.random_range(0.5..2.0)));
        for j in (i + 2)..n {
            if (i, j) != (0, n - 1) && rng.random_bool(chord_prob) {
                edges.push((i, j, rng.random_range(0.5..2.0)));
            }
        }
    }
    WeightedGraph::from_edges(n, &edges).unwrap()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("decomposition");
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(3));
    group.sample_size(10);

    for &n in &[32, 64, 128] {
        let graph = generate_graph(n, 4.0 / n as f64, 42);

        group.bench_function(BenchmarkId::new("amfs", n), |b| {
            b.iter_batched(
                || graph.clone(),
                |graph| black_box(Amfs::new().decompose(&graph, None).unwrap()),
                BatchSize::SmallInput,
            )
        });

        group.bench_function(BenchmarkId::new("harary", n), |b| {
            b.iter_batched(
                || graph.clone(),
                |graph| black_box(Harary::new().decompose(&graph, None).unwrap()),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
