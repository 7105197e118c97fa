//! Bipartite skeleton: the order in which the vertex assigner visits vertices.
//!
//! Breadth-first traversal from vertex 0, then from the lowest-index vertex
//! not reached yet, until every component is covered. Traversal roots seed
//! side S1; everything else is queued in visitation order.

use std::collections::VecDeque;

use log::debug;

use crate::amfs::ResidualGraph;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skeleton {
    /// One root per connected component of the residual, pre-assigned to S1.
    pub roots: Vec<usize>,
    /// Remaining vertices in BFS visitation order.
    pub nodes: Vec<usize>,
}

impl Skeleton {
    pub fn build(residual: &ResidualGraph) -> Self {
        let n = residual.nnodes();
        let mut visited = vec![false; n];
        let mut roots = Vec::new();
        let mut nodes = Vec::with_capacity(n);

        let mut next_root = 0;
        while next_root < n {
            if visited[next_root] {
                next_root += 1;
                continue;
            }
            roots.push(next_root);
            let order = bfs_order(residual, next_root, &mut visited);
            nodes.extend(order.into_iter().skip(1));
        }

        debug!(
            "Skeleton: {} components, {} vertices queued",
            roots.len(),
            nodes.len()
        );
        Self { roots, nodes }
    }
}

/// BFS from `start`, neighbours in ascending index order; marks `visited`.
fn bfs_order(residual: &ResidualGraph, start: usize, visited: &mut [bool]) -> Vec<usize> {
    let mut order = vec![start];
    let mut queue = VecDeque::from([start]);
    visited[start] = true;
    while let Some(u) = queue.pop_front() {
        for (v, _) in residual.neighbours(u) {
            if !visited[v] {
                visited[v] = true;
                order.push(v);
                queue.push_back(v);
            }
        }
    }
    order
}
