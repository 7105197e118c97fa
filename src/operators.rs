//! Explicit sparse matrices of the filter banks.
//!
//! The analysis of a level keeps, at vertex `v`, the row of `H0` when `v` is
//! low and the row of `H1` when it is high. Folding the levels into one
//! running product gives a single `N x N` matrix `T` whose action equals the
//! channel-summed output of [`crate::filterbank::QmfCore::analyze`]:
//!
//! ```text
//! A_m = (H0 + H1) + diag(1 - 2β_m)(H1 - H0)
//! T   = 0.5^M · A_{M-1} ··· A_1 A_0
//! ```
//!
//! `QmfOperator` inverts with `Tᵀ`; `BiorthOperator` builds a second product
//! `T_s` from the synthesis coefficients and inverts with `T_sᵀ`.

use ndarray::{Array, Array2, ArrayBase, Data, Dimension, Ix2};
use sprs::{CsMat, TriMat};

use log::{debug, info};

use crate::chebyshev::{cheby_coeff, cheby_op_basis};
use crate::decomposition::check_stack;
use crate::errors::{QmfError, QmfResult};
use crate::graph::row_entries;
use crate::kernels::{design_biorth_kernel, meyer_kernel, meyer_mirror_kernel, SpectralKernel};
use crate::laplacian::NormalizedLaplacian;

/// `T` for one coefficient pair over a bipartite stack.
pub fn compute_basis(
    bipartite: &[CsMat<f64>],
    coeffs: (&[f64], &[f64]),
    beta: &Array2<bool>,
    lam_max: f64,
) -> QmfResult<CsMat<f64>> {
    check_stack(bipartite, beta)?;
    let (n, m) = beta.dim();

    let mut running: Option<CsMat<f64>> = None;
    for (level, b) in bipartite.iter().enumerate() {
        let laplacian = NormalizedLaplacian::build(b, false);
        let (h0, h1) = cheby_op_basis(&laplacian.matrix, coeffs, lam_max)?;
        let sides: Vec<bool> = beta.column(level).to_vec();
        let selected = select_rows(&h0, &h1, &sides);
        running = Some(match running {
            None => selected,
            Some(t) => &selected * &t,
        });
        debug!("operator level {} folded", level);
    }
    // selecting rows directly is `0.5 · A_m`, so the product needs no rescaling
    running.ok_or_else(|| QmfError::InvalidParameter(format!("empty stack for {} vertices, {} levels", n, m)))
}

/// Row `v` from `h0` when `sides[v]`, else from `h1`.
fn select_rows(h0: &CsMat<f64>, h1: &CsMat<f64>, sides: &[bool]) -> CsMat<f64> {
    let n = sides.len();
    let mut triplets = TriMat::new((n, n));
    for (v, &low) in sides.iter().enumerate() {
        let source = if low { h0 } else { h1 };
        for (j, w) in row_entries(source, v) {
            triplets.add_triplet(v, j, w);
        }
    }
    triplets.to_csr()
}

fn transpose(matrix: &CsMat<f64>) -> CsMat<f64> {
    let (rows, cols) = matrix.shape();
    let mut triplets = TriMat::new((cols, rows));
    for (&w, (i, j)) in matrix.iter() {
        triplets.add_triplet(j, i, w);
    }
    triplets.to_csr()
}

/// `matrix · x` for a rank-1 (`N`) or rank-2 (`N x Ci`) signal, keeping its shape.
fn apply<S, D>(matrix: &CsMat<f64>, x: &ArrayBase<S, D>) -> QmfResult<Array<f64, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let n = matrix.rows();
    let columns: Array2<f64> = match x.ndim() {
        1 => Array2::from_shape_vec((x.len(), 1), x.iter().copied().collect())
            .map_err(|e| QmfError::Numerical(e.to_string()))?,
        2 => x
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|e| QmfError::Numerical(e.to_string()))?
            .to_owned(),
        rank => return Err(QmfError::SignalRank { rank }),
    };
    if columns.nrows() != n {
        return Err(QmfError::VertexMismatch { expected: n, got: columns.nrows() });
    }

    let mut out = Array2::zeros(columns.dim());
    for v in 0..n {
        for (u, w) in row_entries(matrix, v) {
            for c in 0..columns.ncols() {
                out[[v, c]] += w * columns[[u, c]];
            }
        }
    }
    out.into_shape(x.raw_dim())
        .map_err(|e| QmfError::Numerical(e.to_string()))
}

/// Orthogonal QMF as one sparse matrix (Meyer kernels).
#[derive(Debug, Clone)]
pub struct QmfOperator {
    pub operator: CsMat<f64>,
    inverse: CsMat<f64>,
    order: usize,
    lam_max: f64,
}

impl QmfOperator {
    pub fn new(
        bipartite: &[CsMat<f64>],
        beta: &Array2<bool>,
        order: usize,
        lam_max: f64,
    ) -> QmfResult<Self> {
        validate(order, lam_max)?;
        let c0 = cheby_coeff(&meyer_kernel(), order, lam_max);
        let c1 = cheby_coeff(&meyer_mirror_kernel(), order, lam_max);
        let operator = compute_basis(bipartite, (&c0, &c1), beta, lam_max)?;
        info!(
            "QmfOperator: N={}, M={}, order={}, nnz={}",
            beta.nrows(),
            beta.ncols(),
            order,
            operator.nnz()
        );
        let inverse = transpose(&operator);
        Ok(Self { operator, inverse, order, lam_max })
    }

    pub fn transform<S, D>(&self, x: &ArrayBase<S, D>) -> QmfResult<Array<f64, D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        apply(&self.operator, x)
    }

    /// `Tᵀ y`; exact inverse only as far as the Meyer pair is approximated.
    pub fn inverse_transform<S, D>(&self, y: &ArrayBase<S, D>) -> QmfResult<Array<f64, D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        apply(&self.inverse, y)
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn lam_max(&self) -> f64 {
        self.lam_max
    }
}

/// Biorthogonal bank as a pair of sparse matrices; order is `2k`.
#[derive(Debug, Clone)]
pub struct BiorthOperator {
    pub operator: CsMat<f64>,
    pub synthesis_operator: CsMat<f64>,
    inverse: CsMat<f64>,
    orthogonality: f64,
}

impl BiorthOperator {
    pub fn new(bipartite: &[CsMat<f64>], beta: &Array2<bool>, k: usize, lam_max: f64) -> QmfResult<Self> {
        let design = design_biorth_kernel(k)?;
        let order = 2 * k;
        validate(order, lam_max)?;
        let coeffs = |pair: (SpectralKernel, SpectralKernel)| {
            (cheby_coeff(&pair.0, order, lam_max), cheby_coeff(&pair.1, order, lam_max))
        };
        let (a0, a1) = coeffs(design.analysis_pair());
        let (s0, s1) = coeffs(design.synthesis_pair());

        let operator = compute_basis(bipartite, (&a0, &a1), beta, lam_max)?;
        let synthesis_operator = compute_basis(bipartite, (&s0, &s1), beta, lam_max)?;
        info!(
            "BiorthOperator: N={}, M={}, k={}, orthogonality {:.4}",
            beta.nrows(),
            beta.ncols(),
            k,
            design.orthogonality
        );
        let inverse = transpose(&synthesis_operator);
        Ok(Self {
            operator,
            synthesis_operator,
            inverse,
            orthogonality: design.orthogonality,
        })
    }

    pub fn transform<S, D>(&self, x: &ArrayBase<S, D>) -> QmfResult<Array<f64, D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        apply(&self.operator, x)
    }

    /// `T_sᵀ y`.
    pub fn inverse_transform<S, D>(&self, y: &ArrayBase<S, D>) -> QmfResult<Array<f64, D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        apply(&self.inverse, y)
    }

    pub fn orthogonality(&self) -> f64 {
        self.orthogonality
    }
}

fn validate(order: usize, lam_max: f64) -> QmfResult<()> {
    if order == 0 {
        return Err(QmfError::InvalidParameter("order must be at least 1".into()));
    }
    if !(lam_max > 0.0) || !lam_max.is_finite() {
        return Err(QmfError::InvalidParameter(format!(
            "lam_max must be positive and finite, got {}",
            lam_max
        )));
    }
    Ok(())
}
