//! # Laplacians of graphs and of bipartite levels
//!
//! Two families are built here:
//!
//! 1. **Combinatorial** `L = D - A`, used by the structural prior and by the
//!    divergence score of the decomposition.
//! 2. **Per-level normalized** `L = I - D^-1/2 B D^-1/2` of one bipartite level
//!    `B`, the spectral domain of the filter bank. The unit diagonal is stored
//!    explicitly for every vertex, so a vertex that is isolated at that level
//!    keeps a `1` on the diagonal and nothing else.
//!
//! For a bipartite `B` with sides `β` the normalized Laplacian satisfies
//! `J L J = 2I - L` where `J = diag(±1)`, which is what makes the spectral
//! folding of the QMF design work. The spectrum lies in `[0, 2]`.

use sprs::{CsMat, TriMat};

use log::{debug, trace};

use crate::graph::row_entries;

/// Builds `L = D - A` as CSR.
pub fn combinatorial_laplacian(adjacency: &CsMat<f64>) -> CsMat<f64> {
    let n = adjacency.rows();
    let mut triplets = TriMat::new((n, n));
    let mut total_edges = 0;

    for i in 0..n {
        let row = row_entries(adjacency, i);
        let degree: f64 = row.iter().filter(|&&(j, _)| j != i).map(|&(_, w)| w).sum();
        triplets.add_triplet(i, i, degree);
        for (j, w) in row {
            if i != j && w != 0.0 {
                triplets.add_triplet(i, j, -w);
                if i < j {
                    total_edges += 1;
                }
            }
        }
    }

    trace!("Combinatorial Laplacian over {} vertices, {} edges", n, total_edges);
    triplets.to_csr()
}

/// Dense row-major `L + delta * I` of the combinatorial Laplacian.
pub fn dense_regularized_laplacian(adjacency: &CsMat<f64>, delta: f64) -> Vec<f64> {
    let n = adjacency.rows();
    let mut dense = vec![0.0; n * n];
    for i in 0..n {
        let mut degree = 0.0;
        for (j, w) in row_entries(adjacency, i) {
            if i != j {
                dense[i * n + j] -= w;
                degree += w;
            }
        }
        dense[i * n + i] += degree + delta;
    }
    dense
}

/// Symmetrically normalized Laplacian of one bipartite level.
#[derive(Debug, Clone)]
pub struct NormalizedLaplacian {
    /// `I - D^-1/2 B D^-1/2`, zero-degree vertices normalized by 0.
    pub matrix: CsMat<f64>,
    /// `d^-1/2` with zero-degree entries set to 1, kept only for DC preservation.
    pub dc_scale: Option<Vec<f64>>,
}

impl NormalizedLaplacian {
    pub fn build(bipartite: &CsMat<f64>, zero_dc: bool) -> Self {
        let n = bipartite.rows();
        let degrees: Vec<f64> = (0..n)
            .map(|i| row_entries(bipartite, i).iter().map(|&(_, w)| w).sum())
            .collect();

        let deg05: Vec<f64> = degrees
            .iter()
            .map(|&d| if d > 0.0 { d.powf(-0.5) } else { 0.0 })
            .collect();
        let dc_scale = if zero_dc {
            Some(
                degrees
                    .iter()
                    .map(|&d| if d > 0.0 { d.powf(-0.5) } else { 1.0 })
                    .collect(),
            )
        } else {
            None
        };

        let mut triplets = TriMat::new((n, n));
        for i in 0..n {
            for (j, w) in row_entries(bipartite, i) {
                if i != j && w != 0.0 {
                    triplets.add_triplet(i, j, -deg05[i] * w * deg05[j]);
                }
            }
            triplets.add_triplet(i, i, 1.0);
        }
        let matrix: CsMat<f64> = triplets.to_csr();

        let isolated = degrees.iter().filter(|&&d| d == 0.0).count();
        debug!(
            "Normalized level Laplacian: {} vertices, {} non-zeros, {} isolated",
            n,
            matrix.nnz(),
            isolated
        );
        Self { matrix, dc_scale }
    }

    pub fn nnodes(&self) -> usize {
        self.matrix.rows()
    }
}
