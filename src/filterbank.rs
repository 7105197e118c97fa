//! # Critically sampled graph filter banks
//!
//! [`QmfCore`] runs the multi-level two-channel filter bank over a stack of
//! bipartite levels:
//!
//! - **analysis**: for levels `0..M`, filter every channel with that level's
//!   normalized Laplacian and analysis kernels, then keep in channel `c` only
//!   the vertices whose `β` pattern is `c` (critical sampling);
//! - **synthesis**: for levels `M-1..=0`, filter with the synthesis kernels.
//!   Summing the synthesized channels ([`QmfCore::reconstruct`]) inverts the
//!   analysis when the kernels satisfy the perfect-reconstruction identity.
//!
//! Signals may be rank 1 (`N`), rank 2 (`N x Ci`) or rank 3 (`C x N x Ci`);
//! lower ranks are lifted to `1 x N x Ci` and broadcast over channels.
//!
//! [`BiorthCore`] is the same machinery with a designed polynomial
//! biorthogonal kernel pair, which the Chebyshev engine represents exactly.

use std::fmt;

use ndarray::{Array2, Array3, ArrayBase, Axis, Data, Dimension, IxDyn};
use serde::{Deserialize, Serialize};
use sprs::CsMat;

use log::{debug, info, trace};

use crate::channels::{beta_to_channel_mask, channel_names};
use crate::chebyshev::{cheby_coeff, cheby_op};
use crate::decomposition::{check_stack, Decomposition};
use crate::errors::{QmfError, QmfResult};
use crate::kernels::{design_biorth_kernel, meyer_kernel, meyer_mirror_kernel, BiorthDesign, SpectralKernel};
use crate::laplacian::NormalizedLaplacian;

/// Numeric configuration of a filter bank.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct FilterBankParams {
    pub in_channels: usize,
    /// Number of Chebyshev coefficients per kernel.
    pub order: usize,
    /// Upper end of the spectral interval; 2 covers every normalized Laplacian.
    pub lam_max: f64,
    /// Rescale by `D^1/2` / `D^-1/2` around each level so constants survive.
    pub zero_dc: bool,
}

impl Default for FilterBankParams {
    fn default() -> Self {
        Self { in_channels: 1, order: 24, lam_max: 2.0, zero_dc: false }
    }
}

impl FilterBankParams {
    pub fn validate(&self) -> QmfResult<()> {
        if self.in_channels == 0 {
            return Err(QmfError::InvalidParameter("in_channels must be at least 1".into()));
        }
        if self.order == 0 {
            return Err(QmfError::InvalidParameter("order must be at least 1".into()));
        }
        if !(self.lam_max > 0.0) || !self.lam_max.is_finite() {
            return Err(QmfError::InvalidParameter(format!(
                "lam_max must be positive and finite, got {}",
                self.lam_max
            )));
        }
        Ok(())
    }
}

/// How kernels are assigned to (level, channel, input channel).
#[derive(Clone, Debug, Default)]
pub enum KernelSpec {
    /// Meyer low-pass / mirrored high-pass.
    #[default]
    Default,
    /// `(low, high)`: each level/channel picks by its `β` pattern.
    Pair(SpectralKernel, SpectralKernel),
    /// One kernel per `(level, channel, input channel)`, level-major.
    Full(Vec<SpectralKernel>),
}

/// Multi-level graph QMF filter bank.
#[derive(Debug, Clone)]
pub struct QmfCore {
    nnodes: usize,
    levels: usize,
    in_channels: usize,
    out_channels: usize,
    params: FilterBankParams,
    bipartite: Vec<CsMat<f64>>,
    beta: Array2<bool>,
    laplacians: Vec<NormalizedLaplacian>,
    channel_mask: Array2<bool>,
    beta_dist: Array2<bool>,
    channel_names: Vec<String>,
    kernel_a: Vec<SpectralKernel>,
    kernel_s: Vec<SpectralKernel>,
    // per level: Co x Ci x K
    coefficient_a: Vec<Array3<f64>>,
    coefficient_s: Vec<Array3<f64>>,
}

impl QmfCore {
    /// Build from a bipartite stack and its `β`.
    ///
    /// Synthesis kernels default to the analysis kernels (orthogonal QMF).
    pub fn new(
        bipartite: Vec<CsMat<f64>>,
        beta: Array2<bool>,
        analysis: KernelSpec,
        synthesis: Option<KernelSpec>,
        params: FilterBankParams,
    ) -> QmfResult<Self> {
        check_stack(&bipartite, &beta)?;
        params.validate()?;
        let (nnodes, levels) = beta.dim();
        info!(
            "Building filter bank: N={}, M={}, Ci={}, order={}, lam_max={}",
            nnodes, levels, params.in_channels, params.order, params.lam_max
        );

        let laplacians: Vec<NormalizedLaplacian> = bipartite
            .iter()
            .map(|b| NormalizedLaplacian::build(b, params.zero_dc))
            .collect();
        let (channel_mask, beta_dist) = beta_to_channel_mask(&beta);
        let out_channels = beta_dist.nrows();
        let names = channel_names(&beta_dist);

        let mut core = Self {
            nnodes,
            levels,
            in_channels: params.in_channels,
            out_channels,
            params,
            bipartite,
            beta,
            laplacians,
            channel_mask,
            beta_dist,
            channel_names: names,
            kernel_a: Vec::new(),
            kernel_s: Vec::new(),
            coefficient_a: Vec::new(),
            coefficient_s: Vec::new(),
        };

        let synthesis_given = synthesis.is_some();
        core.kernel_a = core.parse_kernels(analysis)?;
        core.coefficient_a = core.coefficients(&core.kernel_a);
        match synthesis {
            Some(spec) => {
                core.kernel_s = core.parse_kernels(spec)?;
                core.coefficient_s = core.coefficients(&core.kernel_s);
            }
            None => {
                core.kernel_s = core.kernel_a.clone();
                core.coefficient_s = core.coefficient_a.clone();
            }
        }

        debug!(
            "Filter bank ready: {} channels ({} non-empty), separate synthesis kernels: {}",
            core.out_channels,
            core.not_empty_channels().len(),
            synthesis_given
        );
        Ok(core)
    }

    /// Meyer QMF over the output of any decomposition strategy.
    pub fn from_decomposition(decomposition: &Decomposition, params: FilterBankParams) -> QmfResult<Self> {
        Self::new(
            decomposition.bipartite.clone(),
            decomposition.beta.clone(),
            KernelSpec::Default,
            None,
            params,
        )
    }

    fn kernel_index(&self, level: usize, channel: usize, input: usize) -> usize {
        (level * self.out_channels + channel) * self.in_channels + input
    }

    fn parse_kernels(&self, spec: KernelSpec) -> QmfResult<Vec<SpectralKernel>> {
        let expected = self.levels * self.out_channels * self.in_channels;
        match spec {
            KernelSpec::Default => Ok(self.kernels_from_beta_dist(&meyer_kernel(), &meyer_mirror_kernel())),
            KernelSpec::Pair(low, high) => Ok(self.kernels_from_beta_dist(&low, &high)),
            KernelSpec::Full(kernels) => {
                if kernels.len() != expected {
                    return Err(QmfError::InvalidKernel(format!(
                        "{} kernels given, {} levels x {} channels x {} inputs = {} expected",
                        kernels.len(),
                        self.levels,
                        self.out_channels,
                        self.in_channels,
                        expected
                    )));
                }
                Ok(kernels)
            }
        }
    }

    fn kernels_from_beta_dist(&self, low: &SpectralKernel, high: &SpectralKernel) -> Vec<SpectralKernel> {
        let mut kernels = Vec::with_capacity(self.levels * self.out_channels * self.in_channels);
        for level in 0..self.levels {
            for channel in 0..self.out_channels {
                let kernel = if self.beta_dist[[channel, level]] { low } else { high };
                for _ in 0..self.in_channels {
                    kernels.push(kernel.clone());
                }
            }
        }
        kernels
    }

    fn coefficients(&self, kernels: &[SpectralKernel]) -> Vec<Array3<f64>> {
        let order = self.params.order;
        (0..self.levels)
            .map(|level| {
                let mut coeffs = Array3::zeros((self.out_channels, self.in_channels, order));
                for c in 0..self.out_channels {
                    for i in 0..self.in_channels {
                        let kernel = &kernels[self.kernel_index(level, c, i)];
                        for (k, value) in cheby_coeff(kernel, order, self.params.lam_max).into_iter().enumerate() {
                            coeffs[[c, i, k]] = value;
                        }
                    }
                }
                coeffs
            })
            .collect()
    }

    /// Normalize a rank-1/2/3 signal to `C x N x Ci`.
    pub fn check_signal<S, D>(&self, x: &ArrayBase<S, D>) -> QmfResult<Array3<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let x = x.view().into_dyn();
        let shape = x.shape().to_vec();
        let (channels, n, ci) = match shape.len() {
            1 => (1, shape[0], 1),
            2 => (1, shape[0], shape[1]),
            3 => (shape[0], shape[1], shape[2]),
            rank => return Err(QmfError::SignalRank { rank }),
        };
        if n != self.nnodes {
            return Err(QmfError::VertexMismatch { expected: self.nnodes, got: n });
        }
        if ci != self.in_channels {
            return Err(QmfError::ChannelMismatch { expected: self.in_channels, got: ci });
        }
        let rank = shape.len();
        Ok(Array3::from_shape_fn((channels, n, ci), |(c, v, i)| match rank {
            1 => x[IxDyn(&[v])],
            2 => x[IxDyn(&[v, i])],
            _ => x[IxDyn(&[c, v, i])],
        }))
    }

    /// Forward transform; returns `Co x N x Ci`.
    pub fn analyze<S, D>(&self, x: &ArrayBase<S, D>) -> QmfResult<Array3<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let x = self.check_signal(x)?;
        self.analyze_checked(x)
    }

    fn analyze_checked(&self, x: Array3<f64>) -> QmfResult<Array3<f64>> {
        let mut y = x;
        for g in 0..self.levels {
            let lap = &self.laplacians[g];
            if let Some(dc) = &lap.dc_scale {
                scale_vertices(&mut y, dc, false);
            }
            y = cheby_op(&y, &lap.matrix, &self.coefficient_a[g], self.params.lam_max)?;
            trace!("analysis level {} done", g);
        }
        for ((c, v, _), value) in y.indexed_iter_mut() {
            if !self.channel_mask[[c, v]] {
                *value = 0.0;
            }
        }
        Ok(y)
    }

    /// Inverse transform per channel; returns `Co x N x Ci`.
    pub fn synthesize<S, D>(&self, y: &ArrayBase<S, D>) -> QmfResult<Array3<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let y = self.check_signal(y)?;
        self.synthesize_checked(y)
    }

    fn synthesize_checked(&self, y: Array3<f64>) -> QmfResult<Array3<f64>> {
        let mut z = y;
        for g in (0..self.levels).rev() {
            let lap = &self.laplacians[g];
            z = cheby_op(&z, &lap.matrix, &self.coefficient_s[g], self.params.lam_max)?;
            if let Some(dc) = &lap.dc_scale {
                scale_vertices(&mut z, dc, true);
            }
            trace!("synthesis level {} done", g);
        }
        Ok(z)
    }

    /// Synthesize and sum over channels; returns `N x Ci`.
    pub fn reconstruct<S, D>(&self, y: &ArrayBase<S, D>) -> QmfResult<Array2<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        Ok(self.synthesize(y)?.sum_axis(Axis(0)))
    }

    /// Channels no vertex maps to.
    pub fn empty_channels(&self) -> Vec<usize> {
        self.channels_where(false)
    }

    pub fn not_empty_channels(&self) -> Vec<usize> {
        self.channels_where(true)
    }

    fn channels_where(&self, occupied: bool) -> Vec<usize> {
        self.channel_mask
            .rows()
            .into_iter()
            .enumerate()
            .filter(|(_, row)| row.iter().any(|&b| b) == occupied)
            .map(|(c, _)| c)
            .collect()
    }

    pub fn nnodes(&self) -> usize {
        self.nnodes
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    pub fn params(&self) -> &FilterBankParams {
        &self.params
    }

    pub fn bipartite(&self) -> &[CsMat<f64>] {
        &self.bipartite
    }

    pub fn beta(&self) -> &Array2<bool> {
        &self.beta
    }

    pub fn laplacians(&self) -> &[NormalizedLaplacian] {
        &self.laplacians
    }

    pub fn channel_mask(&self) -> &Array2<bool> {
        &self.channel_mask
    }

    pub fn beta_dist(&self) -> &Array2<bool> {
        &self.beta_dist
    }

    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    /// Analysis coefficients of one level, `Co x Ci x K`.
    pub fn analysis_coefficients(&self, level: usize) -> &Array3<f64> {
        &self.coefficient_a[level]
    }

    pub fn synthesis_coefficients(&self, level: usize) -> &Array3<f64> {
        &self.coefficient_s[level]
    }

    fn kernel_names(kernels: &[SpectralKernel], count: usize) -> String {
        kernels
            .iter()
            .take(count)
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Divide (`multiply == false`) or multiply every vertex slice by `scale[v]`.
fn scale_vertices(x: &mut Array3<f64>, scale: &[f64], multiply: bool) {
    for ((_, v, _), value) in x.indexed_iter_mut() {
        if multiply {
            *value *= scale[v];
        } else {
            *value /= scale[v];
        }
    }
}

impl fmt::Display for QmfCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let per_level = self.out_channels * self.in_channels;
        write!(
            f,
            "QmfCore(in_channels={}, order={}, lam_max={}, n_channel={}, n_channel(non-empty)={}, N={}, \
             analysis=[{}], synthesis=[{}])",
            self.in_channels,
            self.params.order,
            self.params.lam_max,
            self.out_channels,
            self.not_empty_channels().len(),
            self.nnodes,
            Self::kernel_names(&self.kernel_a, per_level),
            Self::kernel_names(&self.kernel_s, per_level),
        )
    }
}

/// Graph filter bank with a polynomial biorthogonal kernel pair.
#[derive(Debug, Clone)]
pub struct BiorthCore {
    core: QmfCore,
    design: BiorthDesign,
}

impl BiorthCore {
    /// Design the pair for `k` and build the bank; `params.order` should be at
    /// least `2k` for the kernels to be represented exactly.
    pub fn new(
        bipartite: Vec<CsMat<f64>>,
        beta: Array2<bool>,
        k: usize,
        params: FilterBankParams,
    ) -> QmfResult<Self> {
        let design = design_biorth_kernel(k)?;
        let (h0, h1) = design.analysis_pair();
        let (g0, g1) = design.synthesis_pair();
        if params.order < 2 * k {
            debug!(
                "order {} < 2k = {}: biorthogonal kernels are only approximated",
                params.order,
                2 * k
            );
        }
        let core = QmfCore::new(
            bipartite,
            beta,
            KernelSpec::Pair(h0, h1),
            Some(KernelSpec::Pair(g0, g1)),
            params,
        )?;
        info!("Biorthogonal filter bank k={}, orthogonality gap {:.4}", k, design.orthogonality);
        Ok(Self { core, design })
    }

    pub fn from_decomposition(
        decomposition: &Decomposition,
        k: usize,
        params: FilterBankParams,
    ) -> QmfResult<Self> {
        Self::new(decomposition.bipartite.clone(), decomposition.beta.clone(), k, params)
    }

    /// Relative gap between analysis and synthesis low-pass; 0 when orthogonal.
    pub fn orthogonality(&self) -> f64 {
        self.design.orthogonality
    }

    pub fn design(&self) -> &BiorthDesign {
        &self.design
    }

    pub fn core(&self) -> &QmfCore {
        &self.core
    }

    pub fn analyze<S, D>(&self, x: &ArrayBase<S, D>) -> QmfResult<Array3<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        self.core.analyze(x)
    }

    pub fn synthesize<S, D>(&self, y: &ArrayBase<S, D>) -> QmfResult<Array3<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        self.core.synthesize(y)
    }

    pub fn reconstruct<S, D>(&self, y: &ArrayBase<S, D>) -> QmfResult<Array2<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        self.core.reconstruct(y)
    }
}

impl fmt::Display for BiorthCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Biorth{}, orthogonality={:.4}", self.core, self.design.orthogonality)
    }
}
