//! # Spectral kernels of the filter banks
//!
//! A kernel is a scalar function of the graph frequency `λ ∈ [0, lam_max]`.
//!
//! - **Meyer pair** (orthogonal QMF): `h0` is `√2` below `2/3`, `0` above
//!   `4/3`, with a Meyer transition between; `h1(λ) = h0(2 - λ)`. The pair
//!   satisfies `h0(λ)^2 + h1(λ)^2 = 2`.
//! - **Biorthogonal pair**: polynomial `h0`, `g0` whose product is the
//!   maximally flat half-band `P(λ) = 2(1 - λ/2)^k Q(λ/2)`, with
//!   `P(λ) + P(2 - λ) = 2`. The high-pass pair is derived as
//!   `h1(λ) = g0(2 - λ)`, `g1(λ) = h0(2 - λ)`.

use std::f64::consts::{FRAC_PI_2, SQRT_2};
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::errors::{QmfError, QmfResult};

/// Named scalar kernel `λ -> f(λ)`.
#[derive(Clone)]
pub struct SpectralKernel {
    name: String,
    func: Arc<dyn Fn(f64) -> f64 + Send + Sync>,
}

impl SpectralKernel {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self { name: name.into(), func: Arc::new(func) }
    }

    /// Polynomial kernel from ascending coefficients in `λ`.
    pub fn polynomial(name: impl Into<String>, coeffs: Vec<f64>) -> Self {
        Self::new(name, move |x| polyval(&coeffs, x))
    }

    #[inline]
    pub fn eval(&self, lambda: f64) -> f64 {
        (self.func)(lambda)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `λ -> f(2 - λ)`.
    pub fn mirror(&self, name: impl Into<String>) -> Self {
        let func = Arc::clone(&self.func);
        Self::new(name, move |x| func(2.0 - x))
    }
}

impl fmt::Debug for SpectralKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpectralKernel({})", self.name)
    }
}

/// Evaluate a polynomial with ascending coefficients (Horner).
pub fn polyval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

fn meyer_aux(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t.powi(4) * (35.0 - 84.0 * t + 70.0 * t * t - 20.0 * t.powi(3))
}

/// Meyer low-pass on `[0, 2]`.
pub fn meyer(lambda: f64) -> f64 {
    const L1: f64 = 2.0 / 3.0;
    const L2: f64 = 4.0 / 3.0;
    if lambda < L1 {
        SQRT_2
    } else if lambda < L2 {
        SQRT_2 * (FRAC_PI_2 * meyer_aux((lambda - L1) / L1)).cos()
    } else {
        0.0
    }
}

pub fn meyer_kernel() -> SpectralKernel {
    SpectralKernel::new("meyer", meyer)
}

/// `λ -> meyer(2 - λ)`, the QMF high-pass.
pub fn meyer_mirror_kernel() -> SpectralKernel {
    SpectralKernel::new("meyer_mirror", |x| meyer(2.0 - x))
}

fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

fn poly_pow(base: &[f64], exp: usize) -> Vec<f64> {
    (0..exp).fold(vec![1.0], |acc, _| poly_mul(&acc, base))
}

fn binomial(n: usize, k: usize) -> f64 {
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// Ascending coefficients in `y` converted to `λ = 2y`.
fn y_to_lambda(coeffs: Vec<f64>) -> Vec<f64> {
    coeffs
        .into_iter()
        .enumerate()
        .map(|(i, c)| c / 2f64.powi(i as i32))
        .collect()
}

/// Result of [`design_biorth_kernel`].
#[derive(Debug, Clone, PartialEq)]
pub struct BiorthDesign {
    /// Analysis low-pass, ascending coefficients in `λ`.
    pub h0: Vec<f64>,
    /// Synthesis low-pass, ascending coefficients in `λ`.
    pub g0: Vec<f64>,
    /// Relative L2 gap between `h0` and `g0` on `[0, 2]`; 0 for an orthogonal pair.
    pub orthogonality: f64,
}

impl BiorthDesign {
    pub fn analysis_pair(&self) -> (SpectralKernel, SpectralKernel) {
        let h0 = SpectralKernel::polynomial("h0", self.h0.clone());
        let h1 = SpectralKernel::polynomial("g0", self.g0.clone()).mirror("h1");
        (h0, h1)
    }

    pub fn synthesis_pair(&self) -> (SpectralKernel, SpectralKernel) {
        let g0 = SpectralKernel::polynomial("g0", self.g0.clone());
        let g1 = SpectralKernel::polynomial("h0", self.h0.clone()).mirror("g1");
        (g0, g1)
    }
}

/// Design a biorthogonal polynomial pair with `k` vanishing moments at `λ = 2`.
///
/// `P(y) = 2(1 - y)^k Q(y)`, `Q(y) = Σ_{j<k} C(k-1+j, j) y^j`, `y = λ/2`.
/// `h0` takes `(1 - y)^a`, `g0` takes `(1 - y)^(k-a) Q(y)`, both scaled by
/// `√2`; `a` is chosen to make the pair as close to orthogonal as possible.
/// Both polynomials have degree below `2k`.
pub fn design_biorth_kernel(k: usize) -> QmfResult<BiorthDesign> {
    if k == 0 {
        return Err(QmfError::InvalidParameter("biorthogonal design needs k >= 1".into()));
    }
    let one_minus_y = [1.0, -1.0];
    let q: Vec<f64> = (0..k).map(|j| binomial(k - 1 + j, j)).collect();

    let grid: Vec<f64> = (0..=200).map(|i| i as f64 * 0.01).collect();
    let mut best: Option<BiorthDesign> = None;
    for a in 1..=k {
        let h0 = y_to_lambda(poly_pow(&one_minus_y, a).into_iter().map(|c| c * SQRT_2).collect());
        let g0 = y_to_lambda(
            poly_mul(&poly_pow(&one_minus_y, k - a), &q)
                .into_iter()
                .map(|c| c * SQRT_2)
                .collect(),
        );

        let (mut gap, mut hn, mut gn) = (0.0, 0.0, 0.0);
        for &x in &grid {
            let (hv, gv) = (polyval(&h0, x), polyval(&g0, x));
            gap += (hv - gv) * (hv - gv);
            hn += hv * hv;
            gn += gv * gv;
        }
        let orthogonality = gap.sqrt() / hn.max(gn).sqrt();
        debug!("biorth k={} split a={}: orthogonality gap {:.4}", k, a, orthogonality);

        if best.as_ref().map_or(true, |b| orthogonality < b.orthogonality) {
            best = Some(BiorthDesign { h0, g0, orthogonality });
        }
    }
    best.ok_or_else(|| QmfError::InvalidParameter("no biorthogonal split found".into()))
}
