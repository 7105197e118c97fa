//! Regularized precision estimate used as the structural prior of the
//! decomposition: `Σ = sym((L + δI)^-1)` with `L = D - A`.
//!
//! `L + δI` is positive definite for any `δ > 0`, even on disconnected
//! graphs, so the only failure modes are a non-positive `δ` or non-finite
//! weights.

use rayon::prelude::*;
use smartcore::linalg::basic::arrays::Array2;
use smartcore::linalg::basic::matrix::DenseMatrix;
use sprs::CsMat;

use log::{debug, info};

use crate::cholesky::DenseCholesky;
use crate::errors::{QmfError, QmfResult};
use crate::laplacian::dense_regularized_laplacian;

fn check_delta(delta: f64) -> QmfResult<()> {
    if !(delta > 0.0) || !delta.is_finite() {
        return Err(QmfError::InvalidParameter(format!(
            "delta must be positive and finite, got {}",
            delta
        )));
    }
    Ok(())
}

/// `L + δI` as a dense matrix (the precision itself, before inversion).
pub fn precision_matrix(adjacency: &CsMat<f64>, delta: f64) -> QmfResult<DenseMatrix<f64>> {
    check_delta(delta)?;
    let n = adjacency.rows();
    let dense = dense_regularized_laplacian(adjacency, delta);
    Ok(DenseMatrix::from_iterator(dense.into_iter(), n, n, 0))
}

/// Structural prior `Σ`, symmetric and positive definite.
pub fn compute_sigma(adjacency: &CsMat<f64>, delta: f64) -> QmfResult<DenseMatrix<f64>> {
    check_delta(delta)?;
    let n = adjacency.rows();
    info!("Computing structural prior for {} vertices (delta={})", n, delta);

    let precision = dense_regularized_laplacian(adjacency, delta);
    let factor = DenseCholesky::factor(&precision, n)?;
    debug!("Precision factored, logdet={:.6}", factor.logdet());

    // column j of the inverse
    let columns: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|j| {
            let mut e = vec![0.0; n];
            e[j] = 1.0;
            factor.solve(&e)
        })
        .collect();

    let mut sym = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            sym[i * n + j] = 0.5 * (columns[j][i] + columns[i][j]);
        }
    }
    if sym.iter().any(|v| !v.is_finite()) {
        return Err(QmfError::Numerical("structural prior has non-finite entries".into()));
    }

    Ok(DenseMatrix::from_iterator(sym.into_iter(), n, n, 0))
}
