//! # graphqmf
//!
//! Critically sampled two-channel filter banks on arbitrary weighted graphs.
//!
//! A graph is first split into a stack of edge-disjoint bipartite levels
//! ([`decomposition`]): either by the divergence-driven AMFS splitter
//! ([`amfs`]) or by a vertex colouring ([`harary`]). The stack then drives a
//! multi-level graph QMF ([`filterbank::QmfCore`]) or a biorthogonal bank
//! ([`filterbank::BiorthCore`]) whose filters are Chebyshev polynomials of the
//! per-level normalized Laplacians.
//!
//! ```ignore
//! use graphqmf::prelude::*;
//!
//! let graph = WeightedGraph::from_edges(4, &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (3, 0, 1.0)])?;
//! let decomposition = Strategy::Amfs.decompose(&graph, None)?;
//! let qmf = FilterBankBuilder::from_decomposition(&decomposition).build()?;
//! let coefficients = qmf.analyze(&ndarray::arr1(&[1.0, 2.0, 3.0, 4.0]))?;
//! let signal = qmf.reconstruct(&coefficients)?;
//! ```

pub mod amfs;
pub mod assigner;
pub mod builder;
pub mod channels;
pub mod chebyshev;
pub mod cholesky;
pub mod coloring;
pub mod decomposition;
pub mod errors;
pub mod filterbank;
pub mod graph;
pub mod harary;
pub mod kernels;
pub mod laplacian;
pub mod matching;
pub mod operators;
pub mod precision;
pub mod skeleton;

pub mod prelude {
    pub use crate::amfs::{Amfs, AmfsParams};
    pub use crate::assigner::Priority;
    pub use crate::builder::FilterBankBuilder;
    pub use crate::decomposition::{Decomposition, DecompositionStrategy, Strategy};
    pub use crate::errors::{QmfError, QmfResult};
    pub use crate::filterbank::{BiorthCore, FilterBankParams, KernelSpec, QmfCore};
    pub use crate::graph::WeightedGraph;
    pub use crate::harary::Harary;
    pub use crate::kernels::SpectralKernel;
    pub use crate::operators::{BiorthOperator, QmfOperator};
}

#[cfg(test)]
mod tests;
