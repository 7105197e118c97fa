use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use sprs::{CsMat, TriMat};

use log::{debug, info, trace};

use crate::errors::{QmfError, QmfResult};

/// Relative tolerance used when checking adjacency symmetry.
const SYMMETRY_TOL: f64 = 1e-12;

/// Weighted undirected graph held as a symmetric CSR adjacency.
///
/// The adjacency is validated once at construction: square, symmetric,
/// finite, non-negative and without self loops. Everything downstream reads
/// it as trusted input.
#[derive(Debug, Clone)]
pub struct WeightedGraph {
    pub adjacency: CsMat<f64>,
    pub nnodes: usize,
}

impl WeightedGraph {
    /// Wrap an existing sparse adjacency, converting to CSR if needed.
    pub fn from_adjacency(adjacency: CsMat<f64>) -> QmfResult<Self> {
        let (rows, cols) = adjacency.shape();
        if rows != cols {
            return Err(QmfError::InvalidGraph(format!(
                "adjacency must be square, got {}x{}",
                rows, cols
            )));
        }
        if rows == 0 {
            return Err(QmfError::InvalidGraph("graph has no vertices".into()));
        }
        let adjacency = if adjacency.is_csr() {
            adjacency
        } else {
            trace!("Converting adjacency to CSR storage");
            adjacency.to_csr()
        };

        for (&w, (i, j)) in adjacency.iter() {
            if !w.is_finite() || w < 0.0 {
                return Err(QmfError::InvalidGraph(format!(
                    "edge ({}, {}) has weight {}, expected finite and non-negative",
                    i, j, w
                )));
            }
            if i == j && w != 0.0 {
                return Err(QmfError::InvalidGraph(format!("self loop at vertex {}", i)));
            }
            let back = adjacency.get(j, i).copied().unwrap_or(0.0);
            if (w - back).abs() > SYMMETRY_TOL * w.abs().max(back.abs()).max(1.0) {
                return Err(QmfError::InvalidGraph(format!(
                    "adjacency is not symmetric at ({}, {}): {} vs {}",
                    i, j, w, back
                )));
            }
        }

        let graph = Self { adjacency: drop_zeros(&adjacency), nnodes: rows };
        debug!(
            "Validated graph with {} vertices and {} edges",
            graph.nnodes,
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Build from an undirected edge list; both directions are inserted and
    /// repeated edges keep the last weight.
    pub fn from_edges(nnodes: usize, edges: &[(usize, usize, f64)]) -> QmfResult<Self> {
        info!("Building graph with {} vertices from {} edges", nnodes, edges.len());
        let mut map: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for &(i, j, w) in edges {
            if i >= nnodes || j >= nnodes {
                return Err(QmfError::InvalidGraph(format!(
                    "edge ({}, {}) out of range for {} vertices",
                    i, j, nnodes
                )));
            }
            if i == j {
                return Err(QmfError::InvalidGraph(format!("self loop at vertex {}", i)));
            }
            map.insert((i, j), w);
            map.insert((j, i), w);
        }

        let mut triplets = TriMat::new((nnodes, nnodes));
        for ((i, j), w) in map {
            if w != 0.0 {
                triplets.add_triplet(i, j, w);
            }
        }
        let adjacency: CsMat<f64> = triplets.to_csr();
        Self::from_adjacency(adjacency)
    }

    pub fn shape(&self) -> (usize, usize) {
        self.adjacency.shape()
    }

    /// Neighbours of `i` with their weights, ascending by index.
    pub fn neighbours(&self, i: usize) -> Vec<(usize, f64)> {
        row_entries(&self.adjacency, i)
    }

    /// Weighted degree of every vertex.
    pub fn degrees(&self) -> Vec<f64> {
        (0..self.nnodes)
            .map(|i| row_entries(&self.adjacency, i).iter().map(|&(_, w)| w).sum())
            .collect()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().filter(|(_, (i, j))| i < j).count()
    }

    /// Undirected edges as `(i, j, w)` with `i < j`.
    pub fn edges(&self) -> Vec<(usize, usize, f64)> {
        self.adjacency
            .iter()
            .filter(|(_, (i, j))| i < j)
            .map(|(&w, (i, j))| (i, j, w))
            .collect()
    }
}

impl fmt::Display for WeightedGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WeightedGraph(nnodes={}, edges={})",
            self.nnodes,
            self.edge_count()
        )
    }
}

/// Entries of row `i` of a CSR matrix as `(column, value)`.
pub fn row_entries(matrix: &CsMat<f64>, i: usize) -> Vec<(usize, f64)> {
    match matrix.outer_view(i) {
        Some(row) => row.iter().map(|(j, &w)| (j, w)).collect(),
        None => Vec::new(),
    }
}

/// Copy of `matrix` without explicitly stored zeros.
pub fn drop_zeros(matrix: &CsMat<f64>) -> CsMat<f64> {
    let mut triplets = TriMat::new(matrix.shape());
    for (&w, (i, j)) in matrix.iter() {
        if w != 0.0 {
            triplets.add_triplet(i, j, w);
        }
    }
    triplets.to_csr()
}

/// Two-colour the graph by BFS.
///
/// Returns whether the graph is bipartite and the side of every vertex
/// (`true` for the side of each component's lowest-index vertex). The
/// colouring is only meaningful when the first value is `true`.
pub fn is_bipartite(adjacency: &CsMat<f64>) -> (bool, Vec<bool>) {
    let n = adjacency.rows();
    let mut side: Vec<Option<bool>> = vec![None; n];
    let mut bipartite = true;
    let mut queue = VecDeque::new();

    for root in 0..n {
        if side[root].is_some() {
            continue;
        }
        side[root] = Some(true);
        queue.push_back(root);
        while let Some(u) = queue.pop_front() {
            let su = side[u].unwrap_or(true);
            for (v, w) in row_entries(adjacency, u) {
                if w == 0.0 {
                    continue;
                }
                match side[v] {
                    None => {
                        side[v] = Some(!su);
                        queue.push_back(v);
                    }
                    Some(sv) if sv == su => bipartite = false,
                    Some(_) => {}
                }
            }
        }
    }

    (bipartite, side.into_iter().map(|s| s.unwrap_or(true)).collect())
}

/// True if every stored edge of `adjacency` joins vertices on different sides.
pub fn respects_sides(adjacency: &CsMat<f64>, sides: &[bool]) -> bool {
    adjacency
        .iter()
        .all(|(&w, (i, j))| w == 0.0 || sides[i] != sides[j])
}
