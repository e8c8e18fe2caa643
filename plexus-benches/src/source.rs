//! Seeded synthetic inputs for the benchmarks.

use plexus_core::{DenseMatrix, SparseMatrix};
use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::error::BenchSetupError;

/// Planted-partition graph configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CommunityGraphConfig {
    /// Total number of nodes; split as evenly as possible across communities.
    pub nodes: usize,
    /// Number of planted communities.
    pub communities: usize,
    /// Probability of an edge between two nodes of the same community.
    pub intra: f64,
    /// Probability of an edge between nodes of different communities.
    pub inter: f64,
    /// RNG seed.
    pub seed: u64,
}

/// Generates a symmetric adjacency matrix with planted communities.
///
/// # Errors
/// Returns [`BenchSetupError::ZeroValue`] when `nodes` or `communities` is
/// zero.
///
/// # Examples
/// ```
/// use plexus_benches::source::{CommunityGraphConfig, community_graph};
/// use plexus_core::Matrix;
///
/// let graph = community_graph(&CommunityGraphConfig {
///     nodes: 12,
///     communities: 3,
///     intra: 1.0,
///     inter: 0.0,
///     seed: 1,
/// })?;
/// assert_eq!(graph.rows(), 12);
/// assert_eq!(graph.stored_values(), 3 * 12);
/// # Ok::<(), plexus_benches::error::BenchSetupError>(())
/// ```
pub fn community_graph(config: &CommunityGraphConfig) -> Result<SparseMatrix, BenchSetupError> {
    if config.nodes == 0 {
        return Err(BenchSetupError::ZeroValue { context: "nodes" });
    }
    if config.communities == 0 {
        return Err(BenchSetupError::ZeroValue {
            context: "communities",
        });
    }
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let community_of = |node: usize| node % config.communities;
    let mut pairs = Vec::new();
    for left in 0..config.nodes {
        for right in left + 1..config.nodes {
            let probability = if community_of(left) == community_of(right) {
                config.intra
            } else {
                config.inter
            };
            if rng.gen_bool(probability.clamp(0.0, 1.0)) {
                pairs.push((left, right));
            }
        }
    }
    Ok(SparseMatrix::undirected(config.nodes, &pairs)?)
}

/// Generates `points` feature rows around `centres` Gaussian-like blobs.
///
/// # Errors
/// Returns [`BenchSetupError::ZeroValue`] for zero points, centres or
/// dimensions.
pub fn blob_points(
    points: usize,
    centres: usize,
    dimensions: usize,
    seed: u64,
) -> Result<DenseMatrix, BenchSetupError> {
    for (value, context) in [
        (points, "points"),
        (centres, "centres"),
        (dimensions, "dimensions"),
    ] {
        if value == 0 {
            return Err(BenchSetupError::ZeroValue { context });
        }
    }
    let mut rng = SmallRng::seed_from_u64(seed);
    let anchors: Vec<Vec<f64>> = (0..centres)
        .map(|_| (0..dimensions).map(|_| rng.gen_range(-10.0..10.0)).collect())
        .collect();
    let rows = (0..points)
        .map(|point| {
            anchors[point % centres]
                .iter()
                .map(|&anchor| anchor + rng.gen_range(-1.0..1.0) + rng.gen_range(-1.0..1.0))
                .collect()
        })
        .collect();
    Ok(DenseMatrix::from_rows(rows)?)
}
