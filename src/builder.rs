use ndarray::Array2;
use sprs::CsMat;

use log::{debug, info};

use crate::decomposition::Decomposition;
use crate::errors::QmfResult;
use crate::filterbank::{BiorthCore, FilterBankParams, KernelSpec, QmfCore};

/// Default Chebyshev order of the biorthogonal bank when none is configured.
pub const BIORTH_ORDER: usize = 16;

/// Default length parameter of the biorthogonal design.
pub const BIORTH_K: usize = 8;

/// Configures and builds a [`QmfCore`] or [`BiorthCore`] over a bipartite stack.
pub struct FilterBankBuilder {
    bipartite: Vec<CsMat<f64>>,
    beta: Array2<bool>,
    in_channels: usize,
    order: Option<usize>,
    lam_max: f64,
    zero_dc: bool,
    analysis: KernelSpec,
    synthesis: Option<KernelSpec>,
}

impl FilterBankBuilder {
    pub fn new(bipartite: Vec<CsMat<f64>>, beta: Array2<bool>) -> Self {
        debug!(
            "Creating FilterBankBuilder over {} levels, {} vertices",
            bipartite.len(),
            beta.nrows()
        );
        let defaults = FilterBankParams::default();
        Self {
            bipartite,
            beta,
            in_channels: defaults.in_channels,
            order: None,
            lam_max: defaults.lam_max,
            zero_dc: defaults.zero_dc,
            analysis: KernelSpec::Default,
            synthesis: None,
        }
    }

    pub fn from_decomposition(decomposition: &Decomposition) -> Self {
        Self::new(decomposition.bipartite.clone(), decomposition.beta.clone())
    }

    pub fn with_in_channels(mut self, in_channels: usize) -> Self {
        self.in_channels = in_channels;
        self
    }

    /// Number of Chebyshev coefficients per kernel (24 for QMF, 16 for biorth).
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_lam_max(mut self, lam_max: f64) -> Self {
        self.lam_max = lam_max;
        self
    }

    pub fn with_zero_dc(mut self, zero_dc: bool) -> Self {
        self.zero_dc = zero_dc;
        self
    }

    pub fn with_analysis_kernels(mut self, kernels: KernelSpec) -> Self {
        self.analysis = kernels;
        self
    }

    /// Separate synthesis kernels; otherwise the analysis ones are reused.
    pub fn with_synthesis_kernels(mut self, kernels: KernelSpec) -> Self {
        self.synthesis = Some(kernels);
        self
    }

    fn params(&self, default_order: usize) -> FilterBankParams {
        FilterBankParams {
            in_channels: self.in_channels,
            order: self.order.unwrap_or(default_order),
            lam_max: self.lam_max,
            zero_dc: self.zero_dc,
        }
    }

    pub fn build(self) -> QmfResult<QmfCore> {
        let params = self.params(FilterBankParams::default().order);
        info!("Building QMF filter bank with {:?}", params);
        QmfCore::new(self.bipartite, self.beta, self.analysis, self.synthesis, params)
    }

    /// Biorthogonal bank with `k` vanishing moments; configured kernels are ignored.
    pub fn build_biorth(self, k: usize) -> QmfResult<BiorthCore> {
        let params = self.params(BIORTH_ORDER);
        info!("Building biorthogonal filter bank k={} with {:?}", k, params);
        BiorthCore::new(self.bipartite, self.beta, k, params)
    }
}
