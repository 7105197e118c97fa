//! # Vertex assigner
//!
//! Splits the vertices of one residual graph into two sides S1 and S2 so that
//! the cut between them becomes one bipartite level.
//!
//! Vertices are placed one at a time in skeleton order. For a vertex `v` the
//! two candidates are the current cut extended with `v` on S1 (new cut edges go
//! to S2) or on S2 (new cut edges go to S1). Each candidate is scored by
//!
//! - the divergence `trace(L Σ_local) - logdet(L + δI)` of its combinatorial
//!   Laplacian `L` over the placed vertices, and
//! - its structural rank (twice the maximum matching of the cut).
//!
//! ## Incremental state
//!
//! [`LocalSplit`] carries everything needed to score the next vertex without
//! revisiting the placed ones: the trace term as a running sum over cut edges,
//! a Cholesky factor of `L + δI` grown by one vertex plus one rank-one update
//! per new edge, and a maximum matching extended by at most one augmenting
//! path. Committing a vertex folds the winning candidate into that state.

use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;

use log::{debug, trace};

use crate::amfs::ResidualGraph;
use crate::cholesky::{DenseCholesky, IncrementalCholesky};
use crate::errors::QmfResult;
use crate::matching::IncrementalMatching;
use crate::skeleton::Skeleton;

/// Side of the split; S1 becomes the low (`β = true`) side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    S1,
    S2,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::S1 => Side::S2,
            Side::S2 => Side::S1,
        }
    }
}

/// Which criterion decides first.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Priority {
    /// Divergence first, structural rank on near-ties.
    #[default]
    Divergence,
    /// Structural rank first, divergence on ties.
    Rank,
}

/// Scores of one candidate placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateScore {
    pub divergence: f64,
    pub structural_rank: usize,
}

/// What settled a placement; collected into the per-level report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Divergence,
    Rank,
    Balance,
}

/// Counters for one call of [`assign_sides`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentStats {
    pub by_divergence: usize,
    pub by_rank: usize,
    pub by_balance: usize,
}

/// Alternating tie-break; the first tie goes to S1.
#[derive(Debug, Clone)]
pub struct BalanceFlag(bool);

impl Default for BalanceFlag {
    fn default() -> Self {
        Self(true)
    }
}

impl BalanceFlag {
    pub fn next(&mut self) -> Side {
        let side = if self.0 { Side::S1 } else { Side::S2 };
        self.0 = !self.0;
        side
    }
}

/// Placement state over the vertices assigned so far.
pub struct LocalSplit<'a> {
    residual: &'a ResidualGraph,
    sigma: &'a DenseMatrix<f64>,
    // global vertex -> (local index, side)
    placed: Vec<Option<(usize, Side)>>,
    factor: IncrementalCholesky,
    matching: IncrementalMatching,
    trace: f64,
    s1: Vec<usize>,
    s2: Vec<usize>,
}

impl<'a> LocalSplit<'a> {
    pub fn new(
        residual: &'a ResidualGraph,
        sigma: &'a DenseMatrix<f64>,
        delta: f64,
    ) -> QmfResult<Self> {
        Ok(Self {
            residual,
            sigma,
            placed: vec![None; residual.nnodes()],
            factor: IncrementalCholesky::new(delta)?,
            matching: IncrementalMatching::new(),
            trace: 0.0,
            s1: Vec::new(),
            s2: Vec::new(),
        })
    }

    /// Edges from `v` to placed vertices on the side opposite to `side`, as
    /// `(global, local, weight)`.
    fn cut_edges(&self, v: usize, side: Side) -> Vec<(usize, usize, f64)> {
        self.residual
            .neighbours(v)
            .filter_map(|(u, w)| match self.placed[u] {
                Some((local, s)) if s != side && u != v => Some((u, local, w)),
                _ => None,
            })
            .collect()
    }

    fn sigma_at(&self, i: usize, j: usize) -> f64 {
        *self.sigma.get((i, j))
    }

    fn trace_with(&self, v: usize, edges: &[(usize, usize, f64)]) -> f64 {
        let svv = self.sigma_at(v, v);
        self.trace
            + edges
                .iter()
                .map(|&(u, _, w)| w * (svv + self.sigma_at(u, u) - 2.0 * self.sigma_at(u, v)))
                .sum::<f64>()
    }

    fn grown_factor(&self, edges: &[(usize, usize, f64)]) -> QmfResult<IncrementalCholesky> {
        let mut factor = self.factor.clone();
        let lv = factor.push_vertex();
        for &(_, lu, w) in edges {
            factor.add_edge(lv, lu, w)?;
        }
        Ok(factor)
    }

    /// Divergence of the cut with `v` placed on `side`.
    pub fn divergence(&self, v: usize, side: Side) -> QmfResult<f64> {
        let edges = self.cut_edges(v, side);
        let factor = self.grown_factor(&edges)?;
        Ok(self.trace_with(v, &edges) - factor.logdet())
    }

    /// Structural rank of the cut with `v` placed on `side`.
    pub fn structural_rank(&self, v: usize, side: Side) -> usize {
        let locals: Vec<usize> = self.cut_edges(v, side).iter().map(|e| e.1).collect();
        2 * self.matching.size_with(&locals)
    }

    pub fn candidate(&self, v: usize, side: Side) -> QmfResult<CandidateScore> {
        Ok(CandidateScore {
            divergence: self.divergence(v, side)?,
            structural_rank: self.structural_rank(v, side),
        })
    }

    /// Place `v` on `side` and fold its cut edges into the running state.
    pub fn commit(&mut self, v: usize, side: Side) -> QmfResult<()> {
        let edges = self.cut_edges(v, side);
        self.factor = self.grown_factor(&edges)?;
        self.trace = self.trace_with(v, &edges);
        let locals: Vec<usize> = edges.iter().map(|e| e.1).collect();
        let local = self.matching.push_vertex(&locals);
        self.placed[v] = Some((local, side));
        match side {
            Side::S1 => self.s1.push(v),
            Side::S2 => self.s2.push(v),
        }
        Ok(())
    }

    /// Divergence and structural rank of the current cut.
    pub fn current(&self) -> CandidateScore {
        CandidateScore {
            divergence: self.trace - self.factor.logdet(),
            structural_rank: self.matching.structural_rank(),
        }
    }

    pub fn sides(&self) -> (&[usize], &[usize]) {
        (&self.s1, &self.s2)
    }

    pub fn into_sides(self) -> (Vec<usize>, Vec<usize>) {
        (self.s1, self.s2)
    }
}

/// Pick a side for `v` under `priority`.
pub fn decide(
    split: &LocalSplit<'_>,
    v: usize,
    priority: Priority,
    thresh_kld: f64,
    balance: &mut BalanceFlag,
) -> QmfResult<(Side, Decision)> {
    match priority {
        Priority::Divergence => {
            let dk1 = split.divergence(v, Side::S1)?;
            let dk2 = split.divergence(v, Side::S2)?;
            let diff = dk1 - dk2;
            trace!("vertex {}: DK1-DK2 = {:.6e}", v, diff);
            if diff.abs() > thresh_kld {
                let side = if diff > 0.0 { Side::S2 } else { Side::S1 };
                return Ok((side, Decision::Divergence));
            }
            let rank1 = split.structural_rank(v, Side::S1);
            let rank2 = split.structural_rank(v, Side::S2);
            Ok(match rank1.cmp(&rank2) {
                std::cmp::Ordering::Greater => (Side::S1, Decision::Rank),
                std::cmp::Ordering::Less => (Side::S2, Decision::Rank),
                std::cmp::Ordering::Equal => (balance.next(), Decision::Balance),
            })
        }
        Priority::Rank => {
            let rank1 = split.structural_rank(v, Side::S1);
            let rank2 = split.structural_rank(v, Side::S2);
            trace!("vertex {}: rank1={} rank2={}", v, rank1, rank2);
            if rank1 != rank2 {
                let side = if rank1 > rank2 { Side::S1 } else { Side::S2 };
                return Ok((side, Decision::Rank));
            }
            let dk1 = split.divergence(v, Side::S1)?;
            let dk2 = split.divergence(v, Side::S2)?;
            Ok(if dk1 < dk2 {
                (Side::S1, Decision::Divergence)
            } else if dk1 > dk2 {
                (Side::S2, Decision::Divergence)
            } else {
                (balance.next(), Decision::Balance)
            })
        }
    }
}

/// Split all vertices of `residual` into `(S1, S2)`.
pub fn assign_sides(
    residual: &ResidualGraph,
    sigma: &DenseMatrix<f64>,
    delta: f64,
    thresh_kld: f64,
    priority: Priority,
) -> QmfResult<(Vec<usize>, Vec<usize>, AssignmentStats)> {
    let skeleton = Skeleton::build(residual);
    let mut split = LocalSplit::new(residual, sigma, delta)?;
    for &root in &skeleton.roots {
        split.commit(root, Side::S1)?;
    }

    let mut balance = BalanceFlag::default();
    let mut stats = AssignmentStats::default();
    for &v in &skeleton.nodes {
        let (side, decision) = decide(&split, v, priority, thresh_kld, &mut balance)?;
        match decision {
            Decision::Divergence => stats.by_divergence += 1,
            Decision::Rank => stats.by_rank += 1,
            Decision::Balance => stats.by_balance += 1,
        }
        split.commit(v, side)?;
    }

    let (s1, s2) = split.into_sides();
    debug!(
        "Assigned |S1|={} |S2|={} (divergence={}, rank={}, balance={})",
        s1.len(),
        s2.len(),
        stats.by_divergence,
        stats.by_rank,
        stats.by_balance
    );
    Ok((s1, s2, stats))
}

/// From-scratch divergence of a dense local bipartite mask.
///
/// `mask` and `sigma_local` are row-major `n x n` over the same local vertex
/// order. Used to cross-check the incremental scores and to score arbitrary
/// masks.
pub fn dkl_dense(mask: &[f64], sigma_local: &[f64], n: usize, delta: f64) -> QmfResult<f64> {
    let mut lap = vec![0.0; n * n];
    for i in 0..n {
        let mut degree = 0.0;
        for j in 0..n {
            if i != j {
                lap[i * n + j] = -mask[i * n + j];
                degree += mask[i * n + j];
            }
        }
        lap[i * n + i] = degree;
    }

    let mut trace = 0.0;
    for i in 0..n {
        for k in 0..n {
            trace += lap[i * n + k] * sigma_local[k * n + i];
        }
    }

    let mut regularized = lap;
    for i in 0..n {
        regularized[i * n + i] += delta;
    }
    let factor = DenseCholesky::factor(&regularized, n)?;
    Ok(trace - factor.logdet())
}
