//! Colouring-based (Harary) bipartite decomposition.
//!
//! With a proper colouring in `χ` colours and `M = ⌈log2 χ⌉` levels, vertex
//! `v` is low at level `m` when bit `m` of its colour is 0. Each edge goes to
//! the lowest level at which its endpoint colours differ, so its endpoints
//! agree on every earlier level. Edges whose colours only differ above the
//! requested level count are discarded.

use ndarray::Array2;
use sprs::{CsMat, TriMat};

use log::{info, warn};

use crate::coloring::{dsatur, Coloring};
use crate::decomposition::{levels_for_colors, Decomposition, DecompositionStrategy, StrategyMetadata};
use crate::errors::{QmfError, QmfResult};
use crate::graph::WeightedGraph;

#[derive(Debug, Clone, Default)]
pub struct Harary {
    coloring: Option<Coloring>,
}

impl Harary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a given vertex colouring instead of DSATUR.
    pub fn with_coloring(mut self, coloring: Coloring) -> Self {
        self.coloring = Some(coloring);
        self
    }
}

impl DecompositionStrategy for Harary {
    fn name(&self) -> &'static str {
        "harary"
    }

    fn decompose(&self, graph: &WeightedGraph, levels: Option<usize>) -> QmfResult<Decomposition> {
        let n = graph.nnodes;
        let coloring = match &self.coloring {
            Some(c) => {
                if c.colors.len() != n {
                    return Err(QmfError::VertexMismatch { expected: n, got: c.colors.len() });
                }
                if !c.is_proper(graph) {
                    return Err(QmfError::InvalidParameter(
                        "vertex colouring is not proper".into(),
                    ));
                }
                c.clone()
            }
            None => dsatur(graph),
        };
        let levels = match levels {
            Some(0) => {
                return Err(QmfError::InvalidParameter("level count must be at least 1".into()))
            }
            Some(l) => l,
            None => levels_for_colors(coloring.n_color),
        };
        info!(
            "Harary: {} vertices, {} colours, {} levels",
            n, coloring.n_color, levels
        );

        let mut beta = Array2::from_elem((n, levels), false);
        for (v, &c) in coloring.colors.iter().enumerate() {
            for m in 0..levels {
                beta[[v, m]] = (c >> m) & 1 == 0;
            }
        }

        let mut triplets: Vec<TriMat<f64>> = (0..levels).map(|_| TriMat::new((n, n))).collect();
        let mut discarded_edges = 0;
        for (i, j, w) in graph.edges() {
            let diff = coloring.colors[i] ^ coloring.colors[j];
            let level = diff.trailing_zeros() as usize;
            if diff != 0 && level < levels {
                triplets[level].add_triplet(i, j, w);
                triplets[level].add_triplet(j, i, w);
            } else {
                discarded_edges += 1;
            }
        }
        if discarded_edges > 0 {
            warn!("Harary: {} edges discarded", discarded_edges);
        }

        let bipartite: Vec<CsMat<f64>> = triplets.iter().map(|t| t.to_csr()).collect();
        Ok(Decomposition {
            bipartite,
            beta,
            discarded_edges,
            metadata: StrategyMetadata::Harary { coloring },
        })
    }
}
