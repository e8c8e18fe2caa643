//! Link clustering for k-partite graphs.
//!
//! Nodes of a k-partite graph are split into partitions with edges only
//! between partitions. Two adjacent edges then have imposts in the same
//! partition, so the exclusive Jaccard index is used, and a cluster's density
//! is measured against the cross-partition edges it could contain.

use std::sync::Arc;

use tracing::{Dispatch, warn};

use crate::{
    error::{ClusteringError, Result},
    graph::{EdgeList, KPartiteEdgeSimilarity},
    logging::RunLog,
    matrix::Matrix,
    parallel::{Cancellation, Parallelism, Workers},
    result::Assignment,
};

use super::{DensityScorer, LinkClusteringResult, Pipeline, density::cluster_nodes, snapshot};

/// Validated node-to-partition mapping.
///
/// # Examples
/// ```
/// use plexus_core::{ClusteringError, PartitionMap};
///
/// let map = PartitionMap::new(2, vec![0, 0, 1, 1])?;
/// assert_eq!(map.partition_of(2), Some(1));
/// assert!(matches!(
///     PartitionMap::new(2, vec![0, 2]),
///     Err(ClusteringError::InvalidPartition { node: 1, .. })
/// ));
/// # Ok::<(), ClusteringError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionMap {
    partition_count: usize,
    partitions: Arc<[usize]>,
}

impl PartitionMap {
    /// Checks that every node maps to one of `partition_count` partitions.
    ///
    /// # Errors
    /// Returns [`ClusteringError::ZeroPartitions`] when `partition_count` is
    /// zero and [`ClusteringError::InvalidPartition`] for the first node whose
    /// partition is out of range.
    pub fn new(partition_count: usize, node_to_partition: Vec<usize>) -> Result<Self> {
        if partition_count == 0 {
            return Err(ClusteringError::ZeroPartitions);
        }
        if let Some((node, &partition)) = node_to_partition
            .iter()
            .enumerate()
            .find(|&(_, &partition)| partition >= partition_count)
        {
            return Err(ClusteringError::InvalidPartition {
                node,
                partition,
                partition_count,
            });
        }
        Ok(Self {
            partition_count,
            partitions: node_to_partition.into(),
        })
    }

    /// Places `nodes` nodes in partition 0.
    #[must_use]
    pub fn single(nodes: usize) -> Self {
        Self {
            partition_count: 1,
            partitions: vec![0; nodes].into(),
        }
    }

    #[rustfmt::skip]
    /// Returns the number of partitions.
    #[must_use]
    pub fn partition_count(&self) -> usize { self.partition_count }

    /// Returns the number of mapped nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    /// Returns whether no node is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Returns the partition of `node`, if it is mapped.
    #[must_use]
    pub fn partition_of(&self, node: usize) -> Option<usize> {
        self.partitions.get(node).copied()
    }
}

/// Partition density normalised by the possible cross-partition edges.
///
/// A cluster of `m >= 2` edges over `n` nodes, `c_s` of them in partition
/// `s`, scores `m (m + 1 - n) / (cross - 2 (n - 1))` where
/// `cross = n^2 - sum(c_s^2)`. A non-positive denominator scores `0`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KPartiteDensity {
    partitions: PartitionMap,
}

impl KPartiteDensity {
    /// Scores clusters against `partitions`.
    #[must_use]
    pub fn new(partitions: PartitionMap) -> Self {
        Self { partitions }
    }

    /// Returns the mapping used for scoring.
    #[must_use]
    pub fn partitions(&self) -> &PartitionMap {
        &self.partitions
    }
}

impl DensityScorer for KPartiteDensity {
    fn cluster_score(&self, edges: &EdgeList, members: &[usize]) -> Result<f64> {
        let m = members.len();
        if m < 2 {
            return Ok(0.0);
        }
        let nodes = cluster_nodes(edges, members);
        let mut per_partition = vec![0_usize; self.partitions.partition_count()];
        for &node in &nodes {
            let partition = self.partitions.partition_of(node).ok_or(
                ClusteringError::PartitionMappingLength {
                    mapped: self.partitions.len(),
                    nodes: edges.node_count(),
                },
            )?;
            per_partition[partition] += 1;
        }
        let n = nodes.len() as f64;
        let same: f64 = per_partition.iter().map(|&count| (count * count) as f64).sum();
        let denominator = (n * n - same) - 2.0 * (n - 1.0);
        if denominator <= 0.0 {
            return Ok(0.0);
        }
        let m = m as f64;
        Ok(m * (m + 1.0 - n) / denominator)
    }
}

/// Configures [`KPartiteLinkClustering`] runs.
#[derive(Clone, Debug)]
pub struct KPartiteLinkClusteringBuilder {
    partitions: Option<PartitionMap>,
    keep_similarity_matrix: bool,
    parallelism: Parallelism,
    cancellation: Cancellation,
    dispatch: Option<Dispatch>,
}

impl Default for KPartiteLinkClusteringBuilder {
    fn default() -> Self {
        Self {
            partitions: None,
            keep_similarity_matrix: true,
            parallelism: Parallelism::default(),
            cancellation: Cancellation::default(),
            dispatch: None,
        }
    }
}

impl KPartiteLinkClusteringBuilder {
    /// Creates a builder without a partition mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the node-to-partition mapping.
    #[must_use]
    pub fn with_partitions(mut self, partitions: PartitionMap) -> Self {
        self.partitions = Some(partitions);
        self
    }

    /// Computes edge similarities up front (`true`) or on every query.
    #[must_use]
    pub fn with_keep_similarity_matrix_in_memory(mut self, keep: bool) -> Self {
        self.keep_similarity_matrix = keep;
        self
    }

    /// Sets how many workers the parallel regions use.
    #[must_use]
    pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Shares a cancellation flag with the caller.
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Routes every span and event of a run to `dispatch`.
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Finishes the configuration.
    #[must_use]
    pub fn build(self) -> KPartiteLinkClustering {
        KPartiteLinkClustering {
            partitions: self.partitions,
            keep_similarity_matrix: self.keep_similarity_matrix,
            workers: Workers::new(
                self.parallelism,
                self.cancellation,
                RunLog::new(self.dispatch),
            ),
            last: None,
        }
    }
}

/// Link clustering runtime for k-partite graphs.
///
/// # Examples
/// ```
/// use plexus_core::{KPartiteLinkClusteringBuilder, PartitionMap, SparseMatrix};
///
/// // Two disjoint K(2,2) blocks.
/// let graph = SparseMatrix::undirected(
///     8,
///     &[(0, 2), (0, 3), (1, 2), (1, 3), (4, 6), (4, 7), (5, 6), (5, 7)],
/// )?;
/// let partitions = PartitionMap::new(2, vec![0, 0, 1, 1, 0, 0, 1, 1])?;
/// let mut clustering = KPartiteLinkClusteringBuilder::new()
///     .with_partitions(partitions)
///     .build();
/// clustering.run(&graph)?;
/// assert_eq!(clustering.last_run()?.best_density(), 1.0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct KPartiteLinkClustering {
    partitions: Option<PartitionMap>,
    keep_similarity_matrix: bool,
    workers: Workers,
    last: Option<LinkClusteringResult>,
}

impl KPartiteLinkClustering {
    /// Clusters the edges of `matrix` and keeps the result.
    ///
    /// Without a configured mapping every node is placed in partition 0,
    /// which makes every density zero.
    ///
    /// # Errors
    /// Returns [`ClusteringError::PartitionMappingLength`] when the mapping
    /// does not cover exactly the matrix's nodes, plus every error of
    /// [`super::LinkClustering::run`].
    pub fn run<M: Matrix + ?Sized>(&mut self, matrix: &M) -> Result<Vec<Assignment>> {
        let result = self.cluster(matrix)?;
        let assignments = result.assignments().to_vec();
        self.last = Some(result);
        Ok(assignments)
    }

    /// Accepts a cluster count for interface parity; it is logged and ignored.
    ///
    /// # Errors
    /// Fails under the same conditions as [`Self::run`].
    pub fn run_with_cluster_count<M: Matrix + ?Sized>(
        &mut self,
        matrix: &M,
        cluster_count: usize,
    ) -> Result<Vec<Assignment>> {
        self.workers.log().in_scope(|| {
            warn!(
                cluster_count,
                "k-partite link clustering selects the cluster count itself; ignoring request"
            );
        });
        self.run(matrix)
    }

    /// Clusters `matrix` without touching the stored result.
    ///
    /// # Errors
    /// Fails under the same conditions as [`Self::run`].
    pub fn cluster<M: Matrix + ?Sized>(&self, matrix: &M) -> Result<LinkClusteringResult> {
        self.workers.log().in_scope(|| {
            let adjacency = snapshot(matrix)?;
            let nodes = adjacency.node_count();
            let partitions = match &self.partitions {
                Some(partitions) if partitions.len() != nodes => {
                    return Err(ClusteringError::PartitionMappingLength {
                        mapped: partitions.len(),
                        nodes,
                    });
                }
                Some(partitions) => partitions.clone(),
                None => {
                    warn!(nodes, "no partition mapping supplied; using a single partition");
                    PartitionMap::single(nodes)
                }
            };
            let pipeline = Pipeline {
                similarity: Arc::new(KPartiteEdgeSimilarity),
                scorer: Arc::new(KPartiteDensity::new(partitions)),
                keep_similarity_matrix: self.keep_similarity_matrix,
                workers: self.workers.clone(),
            };
            pipeline.run(&adjacency)
        })
    }

    /// Returns the result of the last successful [`Self::run`].
    ///
    /// # Errors
    /// Returns [`ClusteringError::NoCompletedRun`] before the first run.
    pub fn last_run(&self) -> Result<&LinkClusteringResult> {
        self.last.as_ref().ok_or(ClusteringError::NoCompletedRun)
    }

    /// Returns the assignments after `index` merges of the last run.
    ///
    /// # Errors
    /// Returns [`ClusteringError::NoCompletedRun`] before the first run and
    /// [`ClusteringError::SolutionOutOfRange`] for an index past the history.
    pub fn solution(&self, index: usize) -> Result<Vec<Assignment>> {
        self.last_run()?.solution(index)
    }

    /// Returns the partition density after `index` merges of the last run.
    ///
    /// # Errors
    /// Same as [`Self::solution`].
    pub fn solution_density(&self, index: usize) -> Result<f64> {
        self.last_run()?.solution_density(index)
    }

    /// Returns how many solutions the last run offers; `0` before any run.
    #[must_use]
    pub fn number_of_solutions(&self) -> usize {
        self.last
            .as_ref()
            .map_or(0, LinkClusteringResult::number_of_solutions)
    }
}
