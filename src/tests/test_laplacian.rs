use approx::assert_abs_diff_eq;

use crate::graph::{row_entries, WeightedGraph};
use crate::laplacian::*;
use crate::tests::init;
use crate::tests::test_helpers::random_graph;

#[test]
fn test_combinatorial_rows_sum_to_zero() {
    init();
    let graph = random_graph(10, 0.3, 11);
    let lap = combinatorial_laplacian(&graph.adjacency);
    let degrees = graph.degrees();
    for i in 0..graph.nnodes {
        let row = row_entries(&lap, i);
        let sum: f64 = row.iter().map(|&(_, w)| w).sum();
        assert_abs_diff_eq!(sum, 0.0, epsilon = 1e-12);
        let diag = row.iter().find(|&&(j, _)| j == i).map(|&(_, w)| w).unwrap();
        assert_abs_diff_eq!(diag, degrees[i], epsilon = 1e-12);
    }
}

#[test]
fn test_dense_regularized_matches_sparse() {
    init();
    let graph = random_graph(8, 0.4, 5);
    let delta = 0.25;
    let dense = dense_regularized_laplacian(&graph.adjacency, delta);
    let sparse = combinatorial_laplacian(&graph.adjacency);
    let n = graph.nnodes;
    for i in 0..n {
        for j in 0..n {
            let expected = sparse.get(i, j).copied().unwrap_or(0.0) + if i == j { delta } else { 0.0 };
            assert_abs_diff_eq!(dense[i * n + j], expected, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_normalized_level_laplacian() {
    init();
    // star 0-{1,2} plus isolated vertex 3
    let level = WeightedGraph::from_edges(4, &[(0, 1, 1.0), (0, 2, 4.0)]).unwrap();
    let lap = NormalizedLaplacian::build(&level.adjacency, false);
    assert_eq!(lap.nnodes(), 4);
    assert!(lap.dc_scale.is_none());

    for i in 0..4 {
        assert_abs_diff_eq!(*lap.matrix.get(i, i).unwrap(), 1.0, epsilon = 1e-15);
    }
    // -w / sqrt(d0 d1) with d0 = 5, d1 = 1
    assert_abs_diff_eq!(*lap.matrix.get(0, 1).unwrap(), -1.0 / 5f64.sqrt(), epsilon = 1e-12);
    assert_abs_diff_eq!(*lap.matrix.get(2, 0).unwrap(), -4.0 / (5f64 * 4.0).sqrt(), epsilon = 1e-12);
    assert_eq!(row_entries(&lap.matrix, 3), vec![(3, 1.0)]);

    let with_dc = NormalizedLaplacian::build(&level.adjacency, true);
    let dc = with_dc.dc_scale.unwrap();
    assert_abs_diff_eq!(dc[0], 1.0 / 5f64.sqrt(), epsilon = 1e-12);
    assert_abs_diff_eq!(dc[2], 0.5, epsilon = 1e-12);
    assert_eq!(dc[3], 1.0);
}

#[test]
fn test_normalized_laplacian_annihilates_sqrt_degree() {
    init();
    let level = WeightedGraph::from_edges(5, &[(0, 1, 1.0), (1, 2, 2.0), (2, 3, 0.5), (3, 4, 3.0)]).unwrap();
    let lap = NormalizedLaplacian::build(&level.adjacency, false);
    let root_degree: Vec<f64> = level.degrees().iter().map(|d| d.sqrt()).collect();
    for i in 0..5 {
        let value: f64 = row_entries(&lap.matrix, i).iter().map(|&(j, w)| w * root_degree[j]).sum();
        assert_abs_diff_eq!(value, 0.0, epsilon = 1e-12);
    }
}
