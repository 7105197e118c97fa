use approx::assert_abs_diff_eq;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::amfs::ResidualGraph;
use crate::assigner::*;
use crate::precision::compute_sigma;
use crate::skeleton::Skeleton;
use crate::tests::init;
use crate::tests::test_helpers::{max_matching, random_graph};

/// Divergence of the cut over `vertices` (in local order) computed densely.
fn dense_divergence(
    residual: &ResidualGraph,
    sigma: &DenseMatrix<f64>,
    vertices: &[usize],
    sides: &[Side],
    delta: f64,
) -> f64 {
    let n = vertices.len();
    let mut mask = vec![0.0; n * n];
    let mut sigma_local = vec![0.0; n * n];
    for a in 0..n {
        for b in 0..n {
            sigma_local[a * n + b] = *sigma.get((vertices[a], vertices[b]));
        }
        for (u, w) in residual.neighbours(vertices[a]) {
            if let Some(b) = vertices.iter().position(|&x| x == u) {
                if sides[a] != sides[b] {
                    mask[a * n + b] = w;
                }
            }
        }
    }
    dkl_dense(&mask, &sigma_local, n, delta).unwrap()
}

fn cut_rank(residual: &ResidualGraph, vertices: &[usize], sides: &[Side]) -> usize {
    let mut edges = Vec::new();
    for a in 0..vertices.len() {
        for (u, _) in residual.neighbours(vertices[a]) {
            if let Some(b) = vertices.iter().position(|&x| x == u) {
                if a < b && sides[a] != sides[b] {
                    edges.push((a, b));
                }
            }
        }
    }
    2 * max_matching(vertices.len(), &edges)
}

#[test]
fn test_incremental_scores_match_dense() {
    init();
    let graph = random_graph(12, 0.3, 9);
    let delta = 0.1;
    let sigma = compute_sigma(&graph.adjacency, delta).unwrap();
    let residual = ResidualGraph::from_graph(&graph);
    let skeleton = Skeleton::build(&residual);

    let mut split = LocalSplit::new(&residual, &sigma, delta).unwrap();
    let mut vertices = Vec::new();
    let mut sides = Vec::new();
    for &root in &skeleton.roots {
        split.commit(root, Side::S1).unwrap();
        vertices.push(root);
        sides.push(Side::S1);
    }

    let mut balance = BalanceFlag::default();
    for &v in &skeleton.nodes {
        for side in [Side::S1, Side::S2] {
            let mut cand_vertices = vertices.clone();
            cand_vertices.push(v);
            let mut cand_sides = sides.clone();
            cand_sides.push(side);

            let expected = dense_divergence(&residual, &sigma, &cand_vertices, &cand_sides, delta);
            assert_abs_diff_eq!(split.divergence(v, side).unwrap(), expected, epsilon = 1e-8);
            assert_eq!(
                split.structural_rank(v, side),
                cut_rank(&residual, &cand_vertices, &cand_sides)
            );
        }

        let (side, decision) = decide(&split, v, Priority::Divergence, 0.0, &mut balance).unwrap();
        if decision == Decision::Divergence {
            let chosen = split.divergence(v, side).unwrap();
            let other = split.divergence(v, side.opposite()).unwrap();
            assert!(chosen < other);
        }
        split.commit(v, side).unwrap();
        vertices.push(v);
        sides.push(side);

        let current = split.current();
        assert_abs_diff_eq!(
            current.divergence,
            dense_divergence(&residual, &sigma, &vertices, &sides, delta),
            epsilon = 1e-8
        );
        assert_eq!(current.structural_rank, cut_rank(&residual, &vertices, &sides));
    }
}

#[test]
fn test_assign_sides_partitions_vertices() {
    init();
    let graph = random_graph(18, 0.2, 2);
    let sigma = compute_sigma(&graph.adjacency, 0.1).unwrap();
    let residual = ResidualGraph::from_graph(&graph);

    for priority in [Priority::Divergence, Priority::Rank] {
        let (s1, s2, stats) = assign_sides(&residual, &sigma, 0.1, 1e-6, priority).unwrap();
        assert_eq!(s1.len() + s2.len(), 18);
        let mut all: Vec<usize> = s1.iter().chain(s2.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..18).collect::<Vec<_>>());
        // vertex 0 roots the only component
        assert!(s1.contains(&0));
        assert_eq!(stats.by_divergence + stats.by_rank + stats.by_balance, 17);
    }
}

#[test]
fn test_balance_alternates() {
    let mut balance = BalanceFlag::default();
    assert_eq!(balance.next(), Side::S1);
    assert_eq!(balance.next(), Side::S2);
    assert_eq!(balance.next(), Side::S1);
}

#[test]
fn test_dkl_dense_of_empty_mask() {
    init();
    // no edges: trace term vanishes, logdet(δI) = n ln δ
    let n = 3;
    let mask = vec![0.0; n * n];
    let sigma = vec![1.0; n * n];
    let value = dkl_dense(&mask, &sigma, n, 0.5).unwrap();
    assert_abs_diff_eq!(value, -3.0 * 0.5f64.ln(), epsilon = 1e-12);
}
