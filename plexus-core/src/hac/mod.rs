//! Agglomerative clustering over a similarity matrix.
//!
//! The engine keeps, for every active cluster, its most similar partner and
//! its linkage to every other active cluster. A merge derives the new
//! cluster's linkages from its two children and only rescans clusters whose
//! cached partner was consumed; everybody else compares against the new
//! cluster once. The resulting [`Dendrogram`]
//! records every merge so any prefix can be replayed later.

mod dendrogram;
mod engine;

use std::{fmt, str::FromStr};

use tracing::instrument;

use crate::{
    error::{ClusteringError, OptionsError, Result},
    similarity::SimilarityMatrix,
};

pub use self::dendrogram::{Dendrogram, Grouping, Merge};
pub(crate) use self::dendrogram::{ReplayArena, merge_sorted};

/// How the similarity of two clusters is derived from item similarities.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Linkage {
    /// Highest similarity between any cross pair.
    Single,
    /// Lowest similarity between any cross pair.
    #[default]
    Complete,
    /// Arithmetic mean over all cross pairs.
    Mean,
    /// Element `count / 2` of the ascending cross-pair similarities.
    Median,
}

impl Linkage {
    /// Returns the option spelling of this linkage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Complete => "complete",
            Self::Mean => "mean",
            Self::Median => "median",
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Linkage {
    type Err = OptionsError;

    fn from_str(raw: &str) -> core::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "complete" => Ok(Self::Complete),
            "mean" | "average" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            _ => Err(OptionsError::InvalidValue {
                key: "linkage",
                value: raw.into(),
            }),
        }
    }
}

/// Decides when the merge loop stops.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StopRule {
    /// Stop once the best available similarity falls below the threshold.
    Threshold(f64),
    /// Stop once this many clusters remain.
    TargetClusters(usize),
    /// Merge until a single cluster remains.
    Exhaustive,
}

impl StopRule {
    fn validate(self, items: usize) -> Result<Self> {
        match self {
            Self::Threshold(threshold) if threshold.is_nan() => {
                Err(ClusteringError::InvalidThreshold { threshold })
            }
            Self::TargetClusters(target) if target == 0 || target > items => {
                Err(ClusteringError::InvalidTargetClusterCount { target, items })
            }
            rule => Ok(rule),
        }
    }
}

/// Builds the merge history of `matrix` under `linkage` until `stop` holds.
///
/// An empty matrix yields an empty dendrogram.
///
/// # Errors
/// Returns [`ClusteringError::InvalidThreshold`] for a NaN threshold,
/// [`ClusteringError::InvalidTargetClusterCount`] for a target of zero or above
/// the item count, and [`ClusteringError::NonFiniteSimilarity`] when the matrix
/// yields NaN or infinite values.
///
/// # Examples
/// ```
/// use plexus_core::{DenseSimilarityMatrix, Linkage, StopRule, build_dendrogram};
///
/// let matrix = DenseSimilarityMatrix::from_fn(4, |i, j| if j - i == 1 { 0.8 } else { 0.2 });
/// let dendrogram = build_dendrogram(&matrix, Linkage::Single, StopRule::TargetClusters(2))?;
/// assert_eq!(dendrogram.len(), 2);
/// assert_eq!(dendrogram.merges()[0].parent(), 4);
/// # Ok::<(), plexus_core::ClusteringError>(())
/// ```
#[instrument(
    name = "hac.build_dendrogram",
    err,
    skip(matrix, linkage),
    fields(items = matrix.len(), linkage = %linkage),
)]
pub fn build_dendrogram<S: SimilarityMatrix + ?Sized>(
    matrix: &S,
    linkage: Linkage,
    stop: StopRule,
) -> Result<Dendrogram> {
    let stop = stop.validate(matrix.len())?;
    engine::Engine::seed(matrix, linkage)?.run(stop)
}
