//! Partition density of an edge grouping.
//!
//! A partition's density is `2 / E` times the sum of per-cluster scores. The
//! sweep keeps those scores in a [`ScoreTree`] so each merge only touches a
//! logarithmic path and the total does not depend on the order in which
//! clusters were updated.

use crate::{
    error::Result,
    graph::EdgeList,
    hac::Grouping,
};

/// Scores one cluster of edges for partition density.
///
/// Implementations are shared read-only across sweep chunks.
pub trait DensityScorer: Send + Sync {
    /// Returns the contribution of the cluster holding edge ids `members`.
    ///
    /// # Errors
    /// Implementations report failures as [`crate::ClusteringError`]s; the sweep
    /// collects them per chunk.
    fn cluster_score(&self, edges: &EdgeList, members: &[usize]) -> Result<f64>;
}

impl<D: DensityScorer + ?Sized> DensityScorer for &D {
    fn cluster_score(&self, edges: &EdgeList, members: &[usize]) -> Result<f64> {
        (**self).cluster_score(edges, members)
    }
}

/// Distinct nodes touched by the edges `members`, ascending.
pub(crate) fn cluster_nodes(edges: &EdgeList, members: &[usize]) -> Vec<usize> {
    let mut nodes: Vec<usize> = members
        .iter()
        .filter_map(|&id| edges.get(id))
        .flat_map(|edge| [edge.from(), edge.to()])
        .collect();
    nodes.sort_unstable();
    nodes.dedup();
    nodes
}

/// Link-community density: `m (m - (n - 1)) / ((n - 1)(n - 2))` for a cluster
/// of `m >= 2` edges touching `n` nodes, `0` otherwise.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StandardDensity;

impl DensityScorer for StandardDensity {
    fn cluster_score(&self, edges: &EdgeList, members: &[usize]) -> Result<f64> {
        let m = members.len();
        if m < 2 {
            return Ok(0.0);
        }
        let n = cluster_nodes(edges, members).len();
        if n < 3 {
            return Ok(0.0);
        }
        let (m, n) = (m as f64, n as f64);
        Ok(m * (m - (n - 1.0)) / ((n - 1.0) * (n - 2.0)))
    }
}

/// Computes the density of `grouping` from scratch.
///
/// # Errors
/// Propagates the first error raised by `scorer`.
///
/// # Examples
/// ```
/// use plexus_core::{EdgeList, SparseMatrix, StandardDensity, partition_density};
/// use plexus_core::{DenseSimilarityMatrix, Linkage, StopRule, build_dendrogram};
///
/// let triangle = SparseMatrix::undirected(3, &[(0, 1), (1, 2), (0, 2)])?;
/// let edges = EdgeList::from_adjacency(&triangle)?;
/// let all_together = DenseSimilarityMatrix::from_fn(3, |_, _| 1.0);
/// let grouping = build_dendrogram(&all_together, Linkage::Single, StopRule::Exhaustive)?
///     .replay(2)?;
/// assert_eq!(partition_density(&edges, &grouping, &StandardDensity)?, 1.0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn partition_density<D: DensityScorer + ?Sized>(
    edges: &EdgeList,
    grouping: &Grouping,
    scorer: &D,
) -> Result<f64> {
    let mut sum = 0.0;
    for members in grouping.clusters() {
        sum += scorer.cluster_score(edges, members)?;
    }
    Ok(scale(edges.len(), sum))
}

/// Applies the `2 / E` factor; a graph without edges has density `0`.
pub(crate) fn scale(edge_count: usize, sum: f64) -> f64 {
    if edge_count == 0 {
        0.0
    } else {
        2.0 * sum / edge_count as f64
    }
}

/// Fixed-shape binary sum tree over cluster-id slots.
///
/// Every internal node always holds `left + right`, so the root is a function
/// of the current leaf values alone.
#[derive(Clone, Debug)]
pub(crate) struct ScoreTree {
    width: usize,
    nodes: Vec<f64>,
}

impl ScoreTree {
    pub(crate) fn new(slots: usize) -> Self {
        let width = slots.next_power_of_two();
        Self {
            width,
            nodes: vec![0.0; 2 * width],
        }
    }

    /// Stores `value` for `slot`; slots past the allocated width are ignored.
    pub(crate) fn set(&mut self, slot: usize, value: f64) {
        let mut index = self.width + slot;
        debug_assert!(index < self.nodes.len(), "slot {slot} outside the tree");
        let Some(leaf) = self.nodes.get_mut(index) else {
            return;
        };
        *leaf = value;
        while index > 1 {
            index /= 2;
            self.nodes[index] = self.nodes[2 * index] + self.nodes[2 * index + 1];
        }
    }

    pub(crate) fn total(&self) -> f64 {
        self.nodes.get(1).copied().unwrap_or_default()
    }
}
