//! Builder and runtime for agglomerative point clustering.
//!
//! [`AgglomerativeBuilder`] validates the configuration once; the resulting
//! [`Agglomerative`] can then cluster any number of inputs.

use tracing::{Dispatch, info, instrument};

use crate::{
    error::{ClusteringError, Result},
    hac::{Dendrogram, Linkage, StopRule, build_dendrogram},
    logging::RunLog,
    matrix::Matrix,
    options::ClusteringOptions,
    parallel::{Cancellation, Parallelism, Workers},
    result::ClusteringResult,
    similarity::{DenseSimilarityMatrix, SimilarityMatrix, SimilarityMetric},
};

/// Configures and constructs [`Agglomerative`] instances.
///
/// A stop rule is mandatory: either a similarity threshold or a target
/// cluster count.
///
/// # Examples
/// ```
/// use plexus_core::{AgglomerativeBuilder, Linkage};
///
/// let hac = AgglomerativeBuilder::new()
///     .with_linkage(Linkage::Single)
///     .with_target_cluster_count(2)
///     .build()
///     .expect("configuration is valid");
/// assert_eq!(hac.linkage(), Linkage::Single);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AgglomerativeBuilder {
    linkage: Linkage,
    stop: Option<StopRule>,
    metric: SimilarityMetric,
    parallelism: Parallelism,
    cancellation: Cancellation,
    dispatch: Option<Dispatch>,
}

impl AgglomerativeBuilder {
    /// Creates a builder with complete linkage, cosine similarity and no
    /// stop rule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a builder from parsed options. Unset options keep the defaults.
    #[must_use]
    pub fn from_options(options: &ClusteringOptions) -> Self {
        let mut builder = Self::new();
        if let Some(linkage) = options.linkage() {
            builder.linkage = linkage;
        }
        if let Some(metric) = options.similarity_metric() {
            builder.metric = metric;
        }
        builder.stop = options.stop_rule();
        builder
    }

    /// Sets the linkage criterion.
    #[must_use]
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    /// Stops merging once the best similarity drops below `threshold`.
    #[must_use]
    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.stop = Some(StopRule::Threshold(threshold));
        self
    }

    /// Stops merging once `count` clusters remain.
    #[must_use]
    pub fn with_target_cluster_count(mut self, count: usize) -> Self {
        self.stop = Some(StopRule::TargetClusters(count));
        self
    }

    /// Sets the stop rule directly, replacing any threshold or target count.
    #[must_use]
    pub fn with_stop_rule(mut self, stop: StopRule) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Sets the metric applied to feature rows by [`Agglomerative::cluster_matrix`].
    #[must_use]
    pub fn with_similarity_metric(mut self, metric: SimilarityMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Sets how many workers fill the similarity matrix.
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

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns [`ClusteringError::MissingStopRule`] when no stop rule was set,
    /// [`ClusteringError::InvalidThreshold`] for a NaN threshold, and
    /// [`ClusteringError::InvalidTargetClusterCount`] for a target of zero.
    pub fn build(self) -> Result<Agglomerative> {
        let stop = match self.stop {
            None => return Err(ClusteringError::MissingStopRule),
            Some(StopRule::Threshold(threshold)) if threshold.is_nan() => {
                return Err(ClusteringError::InvalidThreshold { threshold });
            }
            Some(StopRule::TargetClusters(0)) => {
                return Err(ClusteringError::InvalidTargetClusterCount {
                    target: 0,
                    items: 0,
                });
            }
            Some(stop) => stop,
        };
        Ok(Agglomerative {
            linkage: self.linkage,
            stop,
            metric: self.metric,
            workers: Workers::new(
                self.parallelism,
                self.cancellation,
                RunLog::new(self.dispatch),
            ),
        })
    }
}

/// Hierarchical agglomerative clustering of points or similarity matrices.
///
/// # Examples
/// ```
/// use plexus_core::{AgglomerativeBuilder, DenseMatrix, Linkage, SimilarityMetric};
///
/// let points = DenseMatrix::from_rows(vec![
///     vec![1.0, 0.0],
///     vec![0.9, 0.1],
///     vec![0.0, 1.0],
///     vec![0.1, 0.9],
/// ])?;
/// let hac = AgglomerativeBuilder::new()
///     .with_linkage(Linkage::Mean)
///     .with_similarity_metric(SimilarityMetric::Cosine)
///     .with_target_cluster_count(2)
///     .build()?;
/// let result = hac.cluster_matrix(&points)?;
/// assert_eq!(result.cluster_count(), 2);
/// assert_eq!(result.clusters(), vec![vec![0, 1], vec![2, 3]]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Agglomerative {
    linkage: Linkage,
    stop: StopRule,
    metric: SimilarityMetric,
    workers: Workers,
}

impl Agglomerative {
    #[rustfmt::skip]
    /// Returns the configured linkage.
    #[must_use]
    pub fn linkage(&self) -> Linkage { self.linkage }

    #[rustfmt::skip]
    /// Returns the configured stop rule.
    #[must_use]
    pub fn stop_rule(&self) -> StopRule { self.stop }

    #[rustfmt::skip]
    /// Returns the metric applied to feature rows.
    #[must_use]
    pub fn similarity_metric(&self) -> SimilarityMetric { self.metric }

    /// Clusters the rows of `matrix` by the configured metric.
    ///
    /// # Errors
    /// Returns [`ClusteringError::EmptyInput`] for a matrix without rows,
    /// [`ClusteringError::InvalidTargetClusterCount`] when the target exceeds
    /// the row count, [`ClusteringError::Cancelled`] when the shared flag was
    /// raised, and [`ClusteringError::TaskFailures`] when any row pair scores
    /// a non-finite similarity.
    pub fn cluster_matrix<M: Matrix + ?Sized>(&self, matrix: &M) -> Result<ClusteringResult> {
        self.workers
            .log()
            .in_scope(|| self.cluster_matrix_inner(matrix))
    }

    /// Clusters items whose pairwise similarities are already known.
    ///
    /// # Errors
    /// Returns [`ClusteringError::EmptyInput`] for an empty matrix,
    /// [`ClusteringError::InvalidTargetClusterCount`] when the target exceeds
    /// the item count and [`ClusteringError::NonFiniteSimilarity`] for NaN or
    /// infinite similarities.
    pub fn cluster_similarities<S: SimilarityMatrix + ?Sized>(
        &self,
        similarities: &S,
    ) -> Result<ClusteringResult> {
        self.workers
            .log()
            .in_scope(|| self.cluster_similarities_inner(similarities))
    }

    /// Returns the merge history without flattening it into labels.
    ///
    /// # Errors
    /// Fails under the same conditions as [`Self::cluster_similarities`].
    pub fn dendrogram<S: SimilarityMatrix + ?Sized>(&self, similarities: &S) -> Result<Dendrogram> {
        self.workers.log().in_scope(|| {
            if similarities.is_empty() {
                return Err(ClusteringError::EmptyInput);
            }
            build_dendrogram(similarities, self.linkage, self.stop)
        })
    }

    #[instrument(
        name = "hac.cluster_matrix",
        err,
        skip(self, matrix),
        fields(rows = matrix.rows(), columns = matrix.columns(), metric = %self.metric),
    )]
    fn cluster_matrix_inner<M: Matrix + ?Sized>(&self, matrix: &M) -> Result<ClusteringResult> {
        if matrix.rows() == 0 {
            return Err(ClusteringError::EmptyInput);
        }
        if let StopRule::TargetClusters(target) = self.stop
            && target > matrix.rows()
        {
            return Err(ClusteringError::InvalidTargetClusterCount {
                target,
                items: matrix.rows(),
            });
        }
        let similarities = DenseSimilarityMatrix::fill(matrix, self.metric, &self.workers)?;
        self.cluster_similarities_inner(&similarities)
    }

    fn cluster_similarities_inner<S: SimilarityMatrix + ?Sized>(
        &self,
        similarities: &S,
    ) -> Result<ClusteringResult> {
        if similarities.is_empty() {
            return Err(ClusteringError::EmptyInput);
        }
        let dendrogram = build_dendrogram(similarities, self.linkage, self.stop)?;
        let merges = dendrogram.len();
        let labels = dendrogram.labels_at(merges)?;
        let cluster_count = dendrogram.cluster_count_at(merges);
        info!(
            items = dendrogram.item_count(),
            clusters = cluster_count,
            "agglomerative clustering completed"
        );
        Ok(ClusteringResult::from_contiguous(labels, cluster_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    use crate::matrix::DenseMatrix;

    #[rstest]
    fn build_requires_stop_rule() {
        let err = AgglomerativeBuilder::new().build().expect_err("no stop rule");
        assert_eq!(err, ClusteringError::MissingStopRule);
        assert_eq!(err.code().as_str(), "CLUSTERING_MISSING_STOP_RULE");
    }

    #[rstest]
    fn build_rejects_nan_threshold() {
        let err = AgglomerativeBuilder::new()
            .with_similarity_threshold(f64::NAN)
            .build()
            .expect_err("NaN threshold");
        assert!(matches!(err, ClusteringError::InvalidThreshold { .. }));
    }

    #[rstest]
    fn later_stop_rule_replaces_earlier() {
        let hac = AgglomerativeBuilder::new()
            .with_similarity_threshold(0.3)
            .with_target_cluster_count(4)
            .build()
            .expect("valid configuration");
        assert_eq!(hac.stop_rule(), StopRule::TargetClusters(4));
    }

    #[rstest]
    fn options_seed_the_builder() {
        let options = ClusteringOptions::parse([
            ("linkage", "median"),
            ("similarity_metric", "euclidean"),
            ("similarity_threshold", "0.4"),
        ])
        .expect("valid options");
        let hac = AgglomerativeBuilder::from_options(&options)
            .build()
            .expect("valid configuration");
        assert_eq!(hac.linkage(), Linkage::Median);
        assert_eq!(hac.similarity_metric(), SimilarityMetric::Euclidean);
        assert_eq!(hac.stop_rule(), StopRule::Threshold(0.4));
    }

    #[rstest]
    fn empty_matrix_is_rejected() {
        let hac = AgglomerativeBuilder::new()
            .with_target_cluster_count(1)
            .build()
            .expect("valid configuration");
        let empty = DenseMatrix::from_rows(Vec::new()).expect("no rows");
        assert_eq!(
            hac.cluster_matrix(&empty).expect_err("no rows"),
            ClusteringError::EmptyInput
        );
    }

    #[rstest]
    fn target_above_row_count_is_rejected() {
        let hac = AgglomerativeBuilder::new()
            .with_target_cluster_count(3)
            .build()
            .expect("valid configuration");
        let points = DenseMatrix::from_rows(vec![vec![1.0], vec![2.0]]).expect("rows");
        assert_eq!(
            hac.cluster_matrix(&points).expect_err("two rows"),
            ClusteringError::InvalidTargetClusterCount {
                target: 3,
                items: 2,
            }
        );
    }

    #[rstest]
    fn cancelled_fill_stops_point_clustering() {
        let cancel = Cancellation::new();
        let hac = AgglomerativeBuilder::new()
            .with_target_cluster_count(1)
            .with_cancellation(cancel.clone())
            .build()
            .expect("valid configuration");
        cancel.cancel();
        let points = DenseMatrix::from_rows(vec![vec![1.0], vec![2.0]]).expect("rows");
        assert!(matches!(
            hac.cluster_matrix(&points),
            Err(ClusteringError::Cancelled { .. })
        ));
    }
}
