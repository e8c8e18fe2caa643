//! Benchmark parameter labels.

use std::fmt;

/// Identifies one link-clustering benchmark input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphBenchParams {
    /// Number of nodes in the synthetic graph.
    pub nodes: usize,
    /// Number of communities planted in the graph.
    pub communities: usize,
    /// Whether edge similarities are kept in memory.
    pub eager: bool,
}

impl fmt::Display for GraphBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.eager { "eager" } else { "lazy" };
        write!(f, "n={},c={},{mode}", self.nodes, self.communities)
    }
}

/// Identifies one agglomerative benchmark input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointBenchParams {
    /// Number of points clustered.
    pub points: usize,
    /// Linkage label, as accepted by `Linkage::from_str`.
    pub linkage: &'static str,
}

impl fmt::Display for PointBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={},{}", self.points, self.linkage)
    }
}
