//! Error type shared by the decomposition and the filter banks.

use thiserror::Error;

/// Root error for every fallible operation in the crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QmfError {
    /// Adjacency is not square, symmetric, finite and non-negative, or carries self loops.
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// Out-of-range configuration value (delta, order, lam_max, ...).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Signal tensors must be rank 1, 2 or 3.
    #[error("rank-1, 2 or 3 signal expected, got rank-{rank}")]
    SignalRank { rank: usize },

    #[error("signal has {got} vertices, the filter bank expects {expected}")]
    VertexMismatch { expected: usize, got: usize },

    #[error("{expected} channels expected, got {got}")]
    ChannelMismatch { expected: usize, got: usize },

    /// Bipartite stack length and beta column count disagree.
    #[error("bipartite stack has {levels} levels but beta has {beta_levels} columns")]
    StackMismatch { levels: usize, beta_levels: usize },

    #[error("invalid kernel specification: {0}")]
    InvalidKernel(String),

    /// Factorization failure or non-finite intermediate value.
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Strategy name not handled by this crate.
    #[error("{0} is not a supported decomposition strategy")]
    UnknownStrategy(String),
}

pub type QmfResult<T> = Result<T, QmfError>;
