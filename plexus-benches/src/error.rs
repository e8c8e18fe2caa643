//! Benchmark setup error type.
//!
//! Setup functions propagate failures with `?` and the Criterion entry
//! points turn them into a single panic message.

use plexus_core::{ClusteringError, MatrixError};

/// Errors that may occur during benchmark setup.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Building an input matrix failed.
    #[error("matrix construction failed: {0}")]
    Matrix(#[from] MatrixError),
    /// Configuring or running a clustering failed.
    #[error("clustering failed: {0}")]
    Clustering(#[from] ClusteringError),
    /// A generator was asked for an empty input.
    #[error("expected a non-zero value for {context}")]
    ZeroValue {
        /// The parameter that was unexpectedly zero.
        context: &'static str,
    },
}
