use approx::assert_abs_diff_eq;
use smartcore::linalg::basic::arrays::Array;

use crate::errors::QmfError;
use crate::graph::WeightedGraph;
use crate::precision::*;
use crate::tests::init;
use crate::tests::test_helpers::random_graph;

#[test]
fn test_sigma_inverts_precision() {
    init();
    let graph = random_graph(12, 0.3, 7);
    let delta = 0.1;
    let sigma = compute_sigma(&graph.adjacency, delta).unwrap();
    let precision = precision_matrix(&graph.adjacency, delta).unwrap();
    let n = graph.nnodes;
    assert_eq!(sigma.shape(), (n, n));

    for i in 0..n {
        for j in 0..n {
            let product: f64 = (0..n).map(|k| *sigma.get((i, k)) * *precision.get((k, j))).sum();
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_abs_diff_eq!(product, expected, epsilon = 1e-8);
            assert_abs_diff_eq!(*sigma.get((i, j)), *sigma.get((j, i)), epsilon = 1e-15);
        }
    }
}

#[test]
fn test_sigma_on_disconnected_graph() {
    init();
    // two components and an isolated vertex
    let graph = WeightedGraph::from_edges(5, &[(0, 1, 1.0), (2, 3, 2.0)]).unwrap();
    let sigma = compute_sigma(&graph.adjacency, 0.5).unwrap();
    assert_abs_diff_eq!(*sigma.get((4, 4)), 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(*sigma.get((0, 2)), 0.0, epsilon = 1e-12);
    assert!(*sigma.get((0, 1)) > 0.0);
}

#[test]
fn test_sigma_rejects_bad_delta() {
    init();
    let graph = random_graph(5, 0.2, 1);
    assert!(matches!(compute_sigma(&graph.adjacency, 0.0), Err(QmfError::InvalidParameter(_))));
    assert!(matches!(compute_sigma(&graph.adjacency, -1.0), Err(QmfError::InvalidParameter(_))));
    assert!(precision_matrix(&graph.adjacency, f64::INFINITY).is_err());
}
