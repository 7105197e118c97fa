//! # Chebyshev polynomial filters on graph Laplacians
//!
//! A kernel `h` on `[0, lam_max]` is approximated as
//!
//! ```text
//! h(λ) ≈ c0/2 + Σ_{k=1}^{K-1} c_k T_k(2λ/lam_max - 1)
//! ```
//!
//! and applied to a signal with the three-term recurrence
//! `T_k = 2 L̃ T_{k-1} - T_{k-2}`, `L̃ = (2/lam_max) L - I`, using only sparse
//! matrix-vector products. The coefficients come from Gauss-Chebyshev
//! quadrature on `K` nodes, which is exact for polynomials of degree `< K`.

use std::f64::consts::PI;

use ndarray::{s, Array3};
use rayon::prelude::*;
use sprs::{CsMat, TriMat};

use log::trace;

use crate::errors::{QmfError, QmfResult};
use crate::graph::row_entries;
use crate::kernels::SpectralKernel;

/// `order` Chebyshev coefficients of `kernel` on `[0, lam_max]`.
pub fn cheby_coeff(kernel: &SpectralKernel, order: usize, lam_max: f64) -> Vec<f64> {
    let half = lam_max / 2.0;
    let k = order as f64;
    let samples: Vec<(f64, f64)> = (0..order)
        .map(|j| {
            let theta = PI * (j as f64 + 0.5) / k;
            (theta, kernel.eval(half * theta.cos() + half))
        })
        .collect();
    (0..order)
        .map(|m| {
            2.0 / k
                * samples
                    .iter()
                    .map(|&(theta, f)| f * (m as f64 * theta).cos())
                    .sum::<f64>()
        })
        .collect()
}

/// Evaluate the Chebyshev expansion at a scalar `λ` (for checking approximations).
pub fn cheby_eval(coeffs: &[f64], lambda: f64, lam_max: f64) -> f64 {
    let x = 2.0 * lambda / lam_max - 1.0;
    let (mut t_prev, mut t_cur) = (1.0, x);
    let mut acc = 0.0;
    for (k, &c) in coeffs.iter().enumerate() {
        let t = match k {
            0 => 1.0,
            1 => x,
            _ => {
                let next = 2.0 * x * t_cur - t_prev;
                t_prev = t_cur;
                t_cur = next;
                next
            }
        };
        acc += if k == 0 { 0.5 * c * t } else { c * t };
    }
    acc
}

/// CSR matrix times dense vector.
pub fn spmv(matrix: &CsMat<f64>, x: &[f64]) -> Vec<f64> {
    (0..matrix.rows())
        .map(|i| row_entries(matrix, i).iter().map(|&(j, w)| w * x[j]).sum())
        .collect()
}

/// `T_k(L̃) x` for `k < order`.
pub fn cheby_terms(laplacian: &CsMat<f64>, x: &[f64], order: usize, lam_max: f64) -> Vec<Vec<f64>> {
    let scale = 2.0 / lam_max;
    let shifted = |v: &[f64]| -> Vec<f64> {
        spmv(laplacian, v)
            .into_iter()
            .zip(v)
            .map(|(lv, &vi)| scale * lv - vi)
            .collect()
    };

    let mut terms: Vec<Vec<f64>> = Vec::with_capacity(order);
    if order == 0 {
        return terms;
    }
    terms.push(x.to_vec());
    if order > 1 {
        terms.push(shifted(x));
    }
    for k in 2..order {
        let next: Vec<f64> = shifted(&terms[k - 1])
            .into_iter()
            .zip(&terms[k - 2])
            .map(|(a, &b)| 2.0 * a - b)
            .collect();
        terms.push(next);
    }
    terms
}

fn combine(terms: &[Vec<f64>], coeffs: &[f64]) -> Vec<f64> {
    let n = terms.first().map_or(0, |t| t.len());
    let mut out = vec![0.0; n];
    for (k, (term, &c)) in terms.iter().zip(coeffs).enumerate() {
        let c = if k == 0 { 0.5 * c } else { c };
        for (o, &t) in out.iter_mut().zip(term) {
            *o += c * t;
        }
    }
    out
}

/// Filter one vertex signal.
pub fn cheby_apply(laplacian: &CsMat<f64>, x: &[f64], coeffs: &[f64], lam_max: f64) -> Vec<f64> {
    combine(&cheby_terms(laplacian, x, coeffs.len(), lam_max), coeffs)
}

/// Batched filtering.
///
/// `x` is `Cx x N x Ci` with `Cx` either 1 (broadcast to every output channel)
/// or `Co`; `coeffs` is `Co x Ci x K`. Returns `Co x N x Ci`. The recurrence
/// runs once per input column and is shared by all channels reading it.
pub fn cheby_op(
    x: &Array3<f64>,
    laplacian: &CsMat<f64>,
    coeffs: &Array3<f64>,
    lam_max: f64,
) -> QmfResult<Array3<f64>> {
    let (cx, n, ci) = x.dim();
    let (co, cci, order) = coeffs.dim();
    if cci != ci {
        return Err(QmfError::ChannelMismatch { expected: cci, got: ci });
    }
    if cx != 1 && cx != co {
        return Err(QmfError::ChannelMismatch { expected: co, got: cx });
    }
    if laplacian.rows() != n {
        return Err(QmfError::VertexMismatch { expected: laplacian.rows(), got: n });
    }
    trace!("cheby_op: {}x{}x{} -> {} channels, order {}", cx, n, ci, co, order);

    let columns: Vec<(usize, usize)> =
        (0..cx).flat_map(|c| (0..ci).map(move |i| (c, i))).collect();
    let filtered: Vec<Vec<(usize, usize, Vec<f64>)>> = columns
        .par_iter()
        .map(|&(xc, i)| {
            let signal = x.slice(s![xc, .., i]).to_vec();
            let terms = cheby_terms(laplacian, &signal, order, lam_max);
            let targets: Vec<usize> = if cx == 1 { (0..co).collect() } else { vec![xc] };
            targets
                .into_iter()
                .map(|c| {
                    let cs = coeffs.slice(s![c, i, ..]).to_vec();
                    (c, i, combine(&terms, &cs))
                })
                .collect()
        })
        .collect();

    let mut out = Array3::zeros((co, n, ci));
    for (c, i, column) in filtered.into_iter().flatten() {
        for (v, value) in column.into_iter().enumerate() {
            out[[c, v, i]] = value;
        }
    }
    Ok(out)
}

fn scaled_identity(n: usize, value: f64) -> CsMat<f64> {
    let mut triplets = TriMat::new((n, n));
    for i in 0..n {
        triplets.add_triplet(i, i, value);
    }
    triplets.to_csr()
}

fn scale(matrix: &CsMat<f64>, factor: f64) -> CsMat<f64> {
    matrix.map(|&v| v * factor)
}

/// Explicit sparse `(H0, H1)` for a two-channel coefficient pair.
pub fn cheby_op_basis(
    laplacian: &CsMat<f64>,
    coeffs: (&[f64], &[f64]),
    lam_max: f64,
) -> QmfResult<(CsMat<f64>, CsMat<f64>)> {
    let (c0, c1) = coeffs;
    if c0.len() != c1.len() || c0.is_empty() {
        return Err(QmfError::InvalidKernel(format!(
            "coefficient pair must be non-empty and of equal length, got {} and {}",
            c0.len(),
            c1.len()
        )));
    }
    let n = laplacian.rows();
    let order = c0.len();

    let identity = scaled_identity(n, 1.0);
    let shifted = &scale(laplacian, 2.0 / lam_max) + &scale(&identity, -1.0);

    let mut h0 = scaled_identity(n, 0.5 * c0[0]);
    let mut h1 = scaled_identity(n, 0.5 * c1[0]);
    let mut t_prev = identity;
    let mut t_cur = shifted.clone();
    for k in 1..order {
        if k > 1 {
            let next = &scale(&(&shifted * &t_cur), 2.0) + &scale(&t_prev, -1.0);
            t_prev = t_cur;
            t_cur = next;
        }
        h0 = &h0 + &scale(&t_cur, c0[k]);
        h1 = &h1 + &scale(&t_cur, c1[k]);
    }
    Ok((h0, h1))
}
