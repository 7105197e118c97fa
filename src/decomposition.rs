//! Decomposition contract shared by every bipartite splitting strategy.
//!
//! A strategy turns a [`WeightedGraph`] into an ordered stack of edge-disjoint
//! bipartite adjacencies plus the `N x M` side-assignment matrix `β`. The
//! filter banks only consume this contract, so any strategy producing a valid
//! [`Decomposition`] can drive them.

use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use sprs::CsMat;

use log::{debug, info};

use crate::amfs::{Amfs, LevelReport};
use crate::assigner::Priority;
use crate::coloring::{dsatur, Coloring};
use crate::errors::{QmfError, QmfResult};
use crate::graph::{respects_sides, WeightedGraph};
use crate::harary::Harary;

/// Strategy-specific details returned next to the stack.
#[derive(Debug, Clone)]
pub enum StrategyMetadata {
    Amfs {
        delta: f64,
        priority: Priority,
        levels: Vec<LevelReport>,
    },
    Harary {
        coloring: Coloring,
    },
}

/// Output of a decomposition.
#[derive(Debug, Clone)]
pub struct Decomposition {
    /// One bipartite adjacency per level, all `N x N`.
    pub bipartite: Vec<CsMat<f64>>,
    /// `β[v, m]` is true iff `v` is on the low side at level `m`.
    pub beta: Array2<bool>,
    /// Undirected edges no level claimed.
    pub discarded_edges: usize,
    pub metadata: StrategyMetadata,
}

impl Decomposition {
    pub fn levels(&self) -> usize {
        self.bipartite.len()
    }

    pub fn nnodes(&self) -> usize {
        self.beta.nrows()
    }

    /// Shape checks between the stack and `β`.
    pub fn validate(&self) -> QmfResult<()> {
        check_stack(&self.bipartite, &self.beta)
    }

    /// Every edge of level `m` joins vertices with different `β[·, m]`.
    pub fn is_bipartite(&self) -> bool {
        self.bipartite.iter().enumerate().all(|(m, b)| {
            let sides: Vec<bool> = self.beta.column(m).to_vec();
            respects_sides(b, &sides)
        })
    }

    /// Every level edge exists in `graph` with the same weight, and no edge
    /// appears in two levels.
    pub fn conserves_edges(&self, graph: &WeightedGraph) -> bool {
        let mut claimed = std::collections::HashSet::new();
        for b in &self.bipartite {
            for (&w, (i, j)) in b.iter() {
                if w == 0.0 || i > j {
                    continue;
                }
                match graph.adjacency.get(i, j) {
                    Some(&orig) if orig == w => {}
                    _ => return false,
                }
                if !claimed.insert((i, j)) {
                    return false;
                }
            }
        }
        true
    }

    /// Number of undirected edges per level.
    pub fn edges_per_level(&self) -> Vec<usize> {
        self.bipartite
            .iter()
            .map(|b| b.iter().filter(|(_, (i, j))| i < j).count())
            .collect()
    }
}

/// Checks that `bipartite` and `beta` describe the same levels and vertices.
pub fn check_stack(bipartite: &[CsMat<f64>], beta: &Array2<bool>) -> QmfResult<()> {
    let (n, m) = beta.dim();
    if bipartite.len() != m {
        return Err(QmfError::StackMismatch { levels: bipartite.len(), beta_levels: m });
    }
    if m == 0 {
        return Err(QmfError::InvalidParameter("at least one level is required".into()));
    }
    for b in bipartite {
        if b.shape() != (n, n) {
            return Err(QmfError::VertexMismatch { expected: n, got: b.rows() });
        }
    }
    Ok(())
}

/// `⌈log2 χ⌉` with `χ` estimated by DSATUR, at least 1.
pub fn default_levels(graph: &WeightedGraph) -> usize {
    let coloring = dsatur(graph);
    levels_for_colors(coloring.n_color)
}

pub(crate) fn levels_for_colors(n_color: usize) -> usize {
    let mut levels = 0;
    while (1usize << levels) < n_color {
        levels += 1;
    }
    levels.max(1)
}

/// A bipartite splitting strategy.
pub trait DecompositionStrategy {
    fn name(&self) -> &'static str;

    /// Decompose into `levels` bipartite levels, or a strategy default when `None`.
    fn decompose(&self, graph: &WeightedGraph, levels: Option<usize>) -> QmfResult<Decomposition>;
}

/// Strategies shipped with the crate, selectable by name.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Strategy {
    #[default]
    Amfs,
    Harary,
}

impl Strategy {
    /// Strategy with default parameters.
    pub fn build(self) -> Box<dyn DecompositionStrategy> {
        debug!("Selecting decomposition strategy {}", self);
        match self {
            Strategy::Amfs => Box::new(Amfs::new()),
            Strategy::Harary => Box::new(Harary::new()),
        }
    }

    pub fn decompose(self, graph: &WeightedGraph, levels: Option<usize>) -> QmfResult<Decomposition> {
        info!("Decomposing {} with strategy {}", graph, self);
        self.build().decompose(graph, levels)
    }
}

impl FromStr for Strategy {
    type Err = QmfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "amfs" => Ok(Strategy::Amfs),
            "harary" => Ok(Strategy::Harary),
            other => Err(QmfError::UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Amfs => write!(f, "amfs"),
            Strategy::Harary => write!(f, "harary"),
        }
    }
}
