//! Dense Cholesky factorization for the regularized Laplacians of the
//! decomposition.
//!
//! [`DenseCholesky`] factors a full matrix once. [`IncrementalCholesky`] keeps a
//! factor of `L + δI` for a growing vertex set: a new vertex enters as an
//! isolated `δ` diagonal, and each new edge `(i, j, w)` is the rank-one update
//! `w (e_i - e_j)(e_i - e_j)ᵀ`. Both updates keep the matrix positive definite,
//! so the factor never has to be rebuilt from scratch.

use crate::errors::{QmfError, QmfResult};

/// Lower-triangular factor of a dense symmetric positive-definite matrix.
#[derive(Debug, Clone)]
pub struct DenseCholesky {
    n: usize,
    // row-major n x n, upper triangle unused
    lower: Vec<f64>,
}

impl DenseCholesky {
    /// Factor a row-major `n x n` matrix.
    pub fn factor(a: &[f64], n: usize) -> QmfResult<Self> {
        if a.len() != n * n {
            return Err(QmfError::InvalidParameter(format!(
                "matrix buffer of length {} is not {}x{}",
                a.len(),
                n,
                n
            )));
        }
        let mut lower = vec![0.0; n * n];
        for j in 0..n {
            let mut diag = a[j * n + j];
            for k in 0..j {
                diag -= lower[j * n + k] * lower[j * n + k];
            }
            if !(diag > 0.0) || !diag.is_finite() {
                return Err(QmfError::Numerical(format!(
                    "matrix is not positive definite (pivot {} = {})",
                    j, diag
                )));
            }
            let ljj = diag.sqrt();
            lower[j * n + j] = ljj;
            for i in (j + 1)..n {
                let mut s = a[i * n + j];
                for k in 0..j {
                    s -= lower[i * n + k] * lower[j * n + k];
                }
                lower[i * n + j] = s / ljj;
            }
        }
        Ok(Self { n, lower })
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    /// Solve `A x = b`.
    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        let n = self.n;
        let mut y = b.to_vec();
        for i in 0..n {
            let mut s = y[i];
            for k in 0..i {
                s -= self.lower[i * n + k] * y[k];
            }
            y[i] = s / self.lower[i * n + i];
        }
        for i in (0..n).rev() {
            let mut s = y[i];
            for k in (i + 1)..n {
                s -= self.lower[k * n + i] * y[k];
            }
            y[i] = s / self.lower[i * n + i];
        }
        y
    }

    /// `log det A`.
    pub fn logdet(&self) -> f64 {
        (0..self.n).map(|i| self.lower[i * self.n + i].ln()).sum::<f64>() * 2.0
    }
}

/// Cholesky factor of `L + δI` over a vertex set that grows one vertex at a time.
///
/// Vertices are indexed by insertion order; row `i` stores `L[i][0..=i]`.
#[derive(Debug, Clone)]
pub struct IncrementalCholesky {
    delta: f64,
    rows: Vec<Vec<f64>>,
}

impl IncrementalCholesky {
    pub fn new(delta: f64) -> QmfResult<Self> {
        if !(delta > 0.0) || !delta.is_finite() {
            return Err(QmfError::InvalidParameter(format!(
                "delta must be positive and finite, got {}",
                delta
            )));
        }
        Ok(Self { delta, rows: Vec::new() })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a vertex with no edges yet; returns its local index.
    pub fn push_vertex(&mut self) -> usize {
        let k = self.rows.len();
        let mut row = vec![0.0; k + 1];
        row[k] = self.delta.sqrt();
        self.rows.push(row);
        k
    }

    /// Add edge `(i, j)` of weight `w` between two local vertices.
    pub fn add_edge(&mut self, i: usize, j: usize, w: f64) -> QmfResult<()> {
        if i == j || w == 0.0 {
            return Ok(());
        }
        let n = self.rows.len();
        if i >= n || j >= n {
            return Err(QmfError::InvalidParameter(format!(
                "edge ({}, {}) outside factor of size {}",
                i, j, n
            )));
        }
        let root = w.sqrt();
        let mut x = vec![0.0; n];
        x[i] = root;
        x[j] = -root;
        self.rank_one_update(&mut x, i.min(j))
    }

    fn rank_one_update(&mut self, x: &mut [f64], start: usize) -> QmfResult<()> {
        let n = self.rows.len();
        for k in start..n {
            if x[k] == 0.0 {
                continue;
            }
            let lkk = self.rows[k][k];
            let r = (lkk * lkk + x[k] * x[k]).sqrt();
            if !(lkk > 0.0) || !r.is_finite() {
                return Err(QmfError::Numerical(format!(
                    "rank-one update broke down at pivot {} (l = {})",
                    k, lkk
                )));
            }
            let c = r / lkk;
            let s = x[k] / lkk;
            self.rows[k][k] = r;
            for i in (k + 1)..n {
                let lik = (self.rows[i][k] + s * x[i]) / c;
                self.rows[i][k] = lik;
                x[i] = c * x[i] - s * lik;
            }
        }
        Ok(())
    }

    pub fn logdet(&self) -> f64 {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| row[i].ln())
            .sum::<f64>()
            * 2.0
    }
}
