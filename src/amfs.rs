//! # AMFS bipartite decomposition
//!
//! Peels one bipartite level per iteration off a residual graph:
//!
//! 1. build the BFS skeleton of the residual,
//! 2. split its vertices into S1/S2 with the dual-criterion assigner,
//! 3. set `β[S1, level] = true`,
//! 4. move every residual edge whose endpoints got different `β` into the
//!    level's adjacency and remove it from the residual.
//!
//! The next level works on what is left, so later levels only see edges
//! inside one side of every earlier split. Whatever is left after the last
//! level is counted in [`Decomposition::discarded_edges`].

use std::collections::BTreeMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use sprs::{CsMat, TriMat};

use log::{debug, info, warn};

use crate::assigner::{assign_sides, AssignmentStats, Priority};
use crate::decomposition::{default_levels, Decomposition, DecompositionStrategy, StrategyMetadata};
use crate::errors::{QmfError, QmfResult};
use crate::graph::WeightedGraph;
use crate::precision::compute_sigma;

/// Numerical parameters of the AMFS split.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct AmfsParams {
    /// Regularization of `L + δI`, must be positive.
    pub delta: f64,
    /// Divergence gaps at or below this fall through to the rank criterion.
    pub thresh_kld: f64,
    pub priority: Priority,
}

impl Default for AmfsParams {
    fn default() -> Self {
        Self { delta: 0.1, thresh_kld: 1e-6, priority: Priority::Divergence }
    }
}

/// Summary of one extracted level.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct LevelReport {
    pub s1_size: usize,
    pub s2_size: usize,
    pub cut_edges: usize,
    pub decisions: AssignmentStats,
}

/// Edges not yet claimed by any level; owned and mutated by the level loop only.
#[derive(Debug, Clone)]
pub struct ResidualGraph {
    adj: Vec<BTreeMap<usize, f64>>,
}

impl ResidualGraph {
    pub fn from_graph(graph: &WeightedGraph) -> Self {
        let mut adj = vec![BTreeMap::new(); graph.nnodes];
        for (&w, (i, j)) in graph.adjacency.iter() {
            if i != j && w != 0.0 {
                adj[i].insert(j, w);
            }
        }
        Self { adj }
    }

    pub fn nnodes(&self) -> usize {
        self.adj.len()
    }

    /// Neighbours of `i` in ascending index order.
    pub fn neighbours(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.adj[i].iter().map(|(&j, &w)| (j, w))
    }

    /// Undirected edge count.
    pub fn edge_count(&self) -> usize {
        self.adj
            .iter()
            .enumerate()
            .map(|(i, row)| row.keys().filter(|&&j| j > i).count())
            .sum()
    }

    /// Remove every edge whose endpoints lie on different sides and return
    /// them as a symmetric CSR adjacency.
    pub fn take_cut(&mut self, sides: &[bool]) -> CsMat<f64> {
        let n = self.adj.len();
        let mut triplets = TriMat::new((n, n));
        for i in 0..n {
            let crossing: Vec<usize> = self.adj[i]
                .keys()
                .copied()
                .filter(|&j| sides[i] != sides[j])
                .collect();
            for j in crossing {
                if let Some(w) = self.adj[i].remove(&j) {
                    triplets.add_triplet(i, j, w);
                }
            }
        }
        triplets.to_csr()
    }
}

/// AMFS decomposition strategy.
#[derive(Debug, Clone, Default)]
pub struct Amfs {
    pub params: AmfsParams,
    sigma: Option<DenseMatrix<f64>>,
}

impl Amfs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(mut self, params: AmfsParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_delta(mut self, delta: f64) -> Self {
        self.params.delta = delta;
        self
    }

    pub fn with_threshold(mut self, thresh_kld: f64) -> Self {
        self.params.thresh_kld = thresh_kld;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.params.priority = priority;
        self
    }

    /// Use a precomputed structural prior instead of deriving it from the graph.
    pub fn with_sigma(mut self, sigma: DenseMatrix<f64>) -> Self {
        self.sigma = Some(sigma);
        self
    }

    fn resolve_sigma(&self, graph: &WeightedGraph) -> QmfResult<DenseMatrix<f64>> {
        match &self.sigma {
            Some(sigma) => {
                let n = graph.nnodes;
                if sigma.shape() != (n, n) {
                    let (r, c) = sigma.shape();
                    return Err(QmfError::InvalidParameter(format!(
                        "structural prior is {}x{}, graph has {} vertices",
                        r, c, n
                    )));
                }
                Ok(sigma.clone())
            }
            None => compute_sigma(&graph.adjacency, self.params.delta),
        }
    }
}

impl DecompositionStrategy for Amfs {
    fn name(&self) -> &'static str {
        "amfs"
    }

    fn decompose(&self, graph: &WeightedGraph, levels: Option<usize>) -> QmfResult<Decomposition> {
        let params = self.params;
        if !(params.delta > 0.0) || !params.delta.is_finite() {
            return Err(QmfError::InvalidParameter(format!(
                "delta must be positive and finite, got {}",
                params.delta
            )));
        }
        if !(params.thresh_kld >= 0.0) {
            return Err(QmfError::InvalidParameter(format!(
                "thresh_kld must be non-negative, got {}",
                params.thresh_kld
            )));
        }
        let levels = match levels {
            Some(0) => {
                return Err(QmfError::InvalidParameter("level count must be at least 1".into()))
            }
            Some(l) => l,
            None => default_levels(graph),
        };

        let n = graph.nnodes;
        info!(
            "AMFS: {} vertices, {} edges, {} levels",
            n,
            graph.edge_count(),
            levels
        );
        debug!("AMFS parameters: {:?}", params);

        let sigma = self.resolve_sigma(graph)?;
        let mut residual = ResidualGraph::from_graph(graph);
        let mut beta = Array2::from_elem((n, levels), false);
        let mut bipartite = Vec::with_capacity(levels);
        let mut reports = Vec::with_capacity(levels);

        for level in 0..levels {
            let (s1, s2, decisions) = assign_sides(
                &residual,
                &sigma,
                params.delta,
                params.thresh_kld,
                params.priority,
            )?;
            for &v in &s1 {
                beta[[v, level]] = true;
            }
            let sides: Vec<bool> = beta.column(level).to_vec();
            let cut = residual.take_cut(&sides);
            let cut_edges = cut.nnz() / 2;
            info!(
                "AMFS level {}: |S1|={}, |S2|={}, {} cut edges, {} edges left",
                level,
                s1.len(),
                s2.len(),
                cut_edges,
                residual.edge_count()
            );
            reports.push(LevelReport {
                s1_size: s1.len(),
                s2_size: s2.len(),
                cut_edges,
                decisions,
            });
            bipartite.push(cut);
        }

        let discarded_edges = residual.edge_count();
        if discarded_edges > 0 {
            warn!(
                "AMFS: {} edges left unclassified after {} levels are discarded",
                discarded_edges, levels
            );
        }

        Ok(Decomposition {
            bipartite,
            beta,
            discarded_edges,
            metadata: StrategyMetadata::Amfs {
                delta: params.delta,
                priority: params.priority,
                levels: reports,
            },
        })
    }
}
