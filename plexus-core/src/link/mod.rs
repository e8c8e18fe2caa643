//! Link-community clustering.
//!
//! Edges of an undirected graph are clustered with single-linkage HAC over
//! pairwise edge similarities. Every prefix of the merge history is scored by
//! partition density, and the densest prefix becomes the reported solution.
//! Because a node belongs to every community of its edges, each node receives
//! a soft [`Assignment`].

mod density;
mod kpartite;
mod sweep;

use std::sync::Arc;

use tracing::{Dispatch, debug, info, instrument, warn};

use crate::{
    error::{ClusteringError, MatrixError, Result},
    graph::{
        AdjacencyIndex, EagerEdgeSimilarity, EdgeList, EdgeSimilarity, JaccardEdgeSimilarity,
        LazyEdgeSimilarity,
    },
    hac::{Dendrogram, Grouping, Linkage, StopRule, build_dendrogram},
    logging::RunLog,
    matrix::{Layout, Matrix, ensure_square},
    options::ClusteringOptions,
    parallel::{Cancellation, Parallelism, Workers},
    result::{Assignment, ClusterId},
};

pub use self::{
    density::{DensityScorer, StandardDensity, partition_density},
    kpartite::{
        KPartiteDensity, KPartiteLinkClustering, KPartiteLinkClusteringBuilder, PartitionMap,
    },
};

use self::sweep::{SweepOutcome, density_sweep};

/// Configures [`LinkClustering`] runs.
///
/// # Examples
/// ```
/// use plexus_core::{LinkClusteringBuilder, SparseMatrix};
///
/// let graph = SparseMatrix::undirected(
///     6,
///     &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)],
/// )?;
/// let mut clustering = LinkClusteringBuilder::new().build();
/// let assignments = clustering.run(&graph)?;
/// assert_eq!(assignments.len(), 6);
/// assert_eq!(clustering.last_run()?.best_density(), 1.0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct LinkClusteringBuilder {
    similarity: Arc<dyn EdgeSimilarity>,
    scorer: Arc<dyn DensityScorer>,
    keep_similarity_matrix: bool,
    parallelism: Parallelism,
    cancellation: Cancellation,
    dispatch: Option<Dispatch>,
}

impl Default for LinkClusteringBuilder {
    fn default() -> Self {
        Self {
            similarity: Arc::new(JaccardEdgeSimilarity),
            scorer: Arc::new(StandardDensity),
            keep_similarity_matrix: true,
            parallelism: Parallelism::default(),
            cancellation: Cancellation::default(),
            dispatch: None,
        }
    }
}

impl std::fmt::Debug for LinkClusteringBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkClusteringBuilder")
            .field("keep_similarity_matrix", &self.keep_similarity_matrix)
            .field("parallelism", &self.parallelism)
            .field("dispatch", &self.dispatch.is_some())
            .finish_non_exhaustive()
    }
}

impl LinkClusteringBuilder {
    /// Creates a builder with Jaccard edge similarity, the standard density
    /// and an in-memory similarity matrix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a builder from parsed options.
    ///
    /// Only `keep_similarity_matrix_in_memory` applies. A target cluster
    /// count is logged and ignored because the density sweep picks the
    /// number of communities.
    #[must_use]
    pub fn from_options(options: &ClusteringOptions) -> Self {
        if let Some(target) = options.target_cluster_count() {
            warn!(
                requested = target,
                "link clustering ignores target_cluster_count"
            );
        }
        let mut builder = Self::new();
        if let Some(keep) = options.keep_similarity_matrix_in_memory() {
            builder.keep_similarity_matrix = keep;
        }
        builder
    }

    /// Computes edge similarities up front (`true`) or on every query.
    #[must_use]
    pub fn with_keep_similarity_matrix_in_memory(mut self, keep: bool) -> Self {
        self.keep_similarity_matrix = keep;
        self
    }

    /// Replaces the edge similarity strategy.
    ///
    /// Use [`crate::WeightedEdgeSimilarity`] for graphs whose edge weights
    /// should shape the communities.
    #[must_use]
    pub fn with_edge_similarity(mut self, similarity: impl EdgeSimilarity + 'static) -> Self {
        self.similarity = Arc::new(similarity);
        self
    }

    /// Replaces the per-cluster density scorer.
    #[must_use]
    pub fn with_density_scorer(mut self, scorer: impl DensityScorer + 'static) -> Self {
        self.scorer = Arc::new(scorer);
        self
    }

    /// Sets how many workers the similarity fill and density sweep use.
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

    /// Finishes the configuration; every combination is valid.
    #[must_use]
    pub fn build(self) -> LinkClustering {
        LinkClustering {
            pipeline: Pipeline {
                similarity: self.similarity,
                scorer: self.scorer,
                keep_similarity_matrix: self.keep_similarity_matrix,
                workers: Workers::new(
                    self.parallelism,
                    self.cancellation,
                    RunLog::new(self.dispatch),
                ),
            },
            last: None,
        }
    }
}

/// Link clustering runtime that remembers its most recent result.
#[derive(Clone, Debug)]
pub struct LinkClustering {
    pipeline: Pipeline,
    last: Option<LinkClusteringResult>,
}

impl LinkClustering {
    /// Clusters the edges of `matrix` and keeps the result for later queries.
    ///
    /// Returns one assignment per node; isolated nodes get an empty one.
    ///
    /// # Errors
    /// Returns [`ClusteringError::Matrix`] for non-square or dense input,
    /// [`ClusteringError::Cancelled`] when the shared flag was raised, and
    /// [`ClusteringError::TaskFailures`] when similarity or density tasks fail.
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
        self.pipeline.workers.log().in_scope(|| {
            warn!(
                cluster_count,
                "link clustering selects the cluster count itself; ignoring request"
            );
        });
        self.run(matrix)
    }

    /// Clusters `matrix` without touching the stored result.
    ///
    /// # Errors
    /// Fails under the same conditions as [`Self::run`].
    pub fn cluster<M: Matrix + ?Sized>(&self, matrix: &M) -> Result<LinkClusteringResult> {
        self.pipeline.execute(matrix)
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

/// Everything a link clustering run produced.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkClusteringResult {
    edges: EdgeList,
    dendrogram: Dendrogram,
    densities: Vec<f64>,
    best_prefix: usize,
    best_density: f64,
    assignments: Vec<Assignment>,
}

impl LinkClusteringResult {
    /// Returns the edges in discovery order; edge ids index this list.
    #[must_use]
    pub fn edges(&self) -> &EdgeList {
        &self.edges
    }

    /// Returns the single-linkage merge history over the edges.
    #[must_use]
    pub fn dendrogram(&self) -> &Dendrogram {
        &self.dendrogram
    }

    /// Returns the density after each merge prefix `0..number_of_solutions()`.
    #[must_use]
    pub fn densities(&self) -> &[f64] {
        &self.densities
    }

    /// Returns the prefix with the highest density, lowest on ties.
    #[must_use]
    pub fn best_solution(&self) -> usize {
        self.best_prefix
    }

    #[rustfmt::skip]
    /// Returns the density of [`Self::best_solution`].
    #[must_use]
    pub fn best_density(&self) -> f64 { self.best_density }

    /// Returns the soft assignment of every node at the best prefix.
    #[must_use]
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Returns how many prefixes were scored.
    #[must_use]
    pub fn number_of_solutions(&self) -> usize {
        self.dendrogram.len()
    }

    /// Returns the soft assignments after `index` merges.
    ///
    /// # Errors
    /// Returns [`ClusteringError::SolutionOutOfRange`] when `index` is not
    /// below [`Self::number_of_solutions`].
    pub fn solution(&self, index: usize) -> Result<Vec<Assignment>> {
        self.check_solution(index)?;
        Ok(assign(&self.edges, &self.dendrogram.replay(index)?))
    }

    /// Returns the partition density after `index` merges.
    ///
    /// # Errors
    /// Same as [`Self::solution`].
    pub fn solution_density(&self, index: usize) -> Result<f64> {
        self.check_solution(index)?;
        Ok(self.densities[index])
    }

    fn check_solution(&self, index: usize) -> Result<()> {
        let solutions = self.number_of_solutions();
        if index < solutions {
            Ok(())
        } else {
            Err(ClusteringError::SolutionOutOfRange { index, solutions })
        }
    }
}

/// Strategy pair and execution context shared by both link runtimes.
#[derive(Clone)]
pub(crate) struct Pipeline {
    pub(crate) similarity: Arc<dyn EdgeSimilarity>,
    pub(crate) scorer: Arc<dyn DensityScorer>,
    pub(crate) keep_similarity_matrix: bool,
    pub(crate) workers: Workers,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("keep_similarity_matrix", &self.keep_similarity_matrix)
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub(crate) fn execute<M: Matrix + ?Sized>(&self, matrix: &M) -> Result<LinkClusteringResult> {
        self.workers.log().in_scope(|| {
            let adjacency = snapshot(matrix)?;
            self.run(&adjacency)
        })
    }

    #[instrument(
        name = "link.run",
        err,
        skip_all,
        fields(nodes = adjacency.node_count(), eager = self.keep_similarity_matrix),
    )]
    pub(crate) fn run(&self, adjacency: &AdjacencyIndex) -> Result<LinkClusteringResult> {
        let edges = EdgeList::from_index(adjacency);
        debug!(
            edges = edges.len(),
            injected_log = self.workers.log().is_injected(),
            "edge list derived"
        );
        let dendrogram = if self.keep_similarity_matrix {
            let matrix =
                EagerEdgeSimilarity::fill(&edges, adjacency, &*self.similarity, &self.workers)?;
            build_dendrogram(&matrix, Linkage::Single, StopRule::Exhaustive)?
        } else {
            let matrix = LazyEdgeSimilarity::new(&edges, adjacency, &*self.similarity);
            build_dendrogram(&matrix, Linkage::Single, StopRule::Exhaustive)?
        };
        let SweepOutcome {
            densities,
            best_prefix,
            best_density,
        } = density_sweep(&edges, &dendrogram, &*self.scorer, &self.workers)?;
        let assignments = assign(&edges, &dendrogram.replay(best_prefix)?);
        info!(
            edges = edges.len(),
            best_prefix,
            best_density,
            communities = dendrogram.cluster_count_at(best_prefix),
            "link clustering completed"
        );
        Ok(LinkClusteringResult {
            edges,
            dendrogram,
            densities,
            best_prefix,
            best_density,
            assignments,
        })
    }
}

/// Accepts square sparse matrices only.
fn snapshot<M: Matrix + ?Sized>(matrix: &M) -> Result<AdjacencyIndex> {
    ensure_square(matrix)?;
    if matrix.layout() != Layout::Sparse {
        return Err(MatrixError::NotSparse.into());
    }
    Ok(AdjacencyIndex::from_matrix(matrix)?)
}

/// Labels clusters by position and adds each label to both endpoints of
/// every member edge.
fn assign(edges: &EdgeList, grouping: &Grouping) -> Vec<Assignment> {
    let mut assignments = vec![Assignment::default(); edges.node_count()];
    for (label, members) in grouping.clusters().iter().enumerate() {
        let id = ClusterId::from_index(label);
        for edge in members.iter().filter_map(|&member| edges.get(member)) {
            assignments[edge.from()].insert(id);
            assignments[edge.to()].insert(id);
        }
    }
    assignments
}
