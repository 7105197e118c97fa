use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use graphqmf::builder::{FilterBankBuilder, BIORTH_K};
use graphqmf::decomposition::Strategy;
use graphqmf::graph::WeightedGraph;
use graphqmf::operators::QmfOperator;
use ndarray::Array2;
use rand::prelude::*;
use std::hint::black_box;
use std::time::Duration;

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
    let mut group = c.benchmark_group("filterbank");
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(3));
    group.sample_size(20);

    for &n in &[64, 256, 1024] {
        let graph = generate_graph(n, 6.0 / n as f64, 7);
        let decomposition = Strategy::Harary.decompose(&graph, None).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let x = Array2::from_shape_fn((n, 4), |_| rng.random_range(-1.0..1.0));

        let qmf = FilterBankBuilder::from_decomposition(&decomposition)
            .with_in_channels(4)
            .build()
            .unwrap();
        group.bench_function(BenchmarkId::new("qmf_analyze", n), |b| {
            b.iter(|| black_box(qmf.analyze(&x).unwrap()))
        });
        let y = qmf.analyze(&x).unwrap();
        group.bench_function(BenchmarkId::new("qmf_reconstruct", n), |b| {
            b.iter(|| black_box(qmf.reconstruct(&y).unwrap()))
        });

        let biorth = FilterBankBuilder::from_decomposition(&decomposition)
            .with_in_channels(4)
            .build_biorth(BIORTH_K)
            .unwrap();
        group.bench_function(BenchmarkId::new("biorth_analyze", n), |b| {
            b.iter(|| black_box(biorth.analyze(&x).unwrap()))
        });

        if n <= 256 {
            let operator = QmfOperator::new(&decomposition.bipartite, &decomposition.beta, 24, 2.0).unwrap();
            group.bench_function(BenchmarkId::new("qmf_operator_transform", n), |b| {
                b.iter(|| black_box(operator.transform(&x).unwrap()))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
