//! Plexus core library.
//!
//! Agglomerative clustering of points or precomputed similarities, and
//! link-community clustering of graph edges with overlapping node membership.
//!
//! With the `metrics` feature enabled the library records
//! `plexus_hac_merges_total` (counter) and `plexus_density_sweep_seconds`
//! (histogram) through the `metrics` facade.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod error;
mod graph;
mod hac;
mod link;
mod logging;
mod matrix;
mod options;
mod parallel;
mod result;
mod similarity;

#[cfg(test)]
mod test_utils;

pub use crate::{
    builder::{Agglomerative, AgglomerativeBuilder},
    error::{
        ClusteringError, ClusteringErrorCode, MatrixError, MatrixErrorCode, OptionsError,
        OptionsErrorCode, ParallelRegion, Result, TaskFailure,
    },
    graph::{
        AdjacencyIndex, EagerEdgeSimilarity, Edge, EdgeList, EdgeSimilarity,
        JaccardEdgeSimilarity, KPartiteEdgeSimilarity, LazyEdgeSimilarity,
        WeightedEdgeSimilarity,
    },
    hac::{Dendrogram, Grouping, Linkage, Merge, StopRule, build_dendrogram},
    link::{
        DensityScorer, KPartiteDensity, KPartiteLinkClustering, KPartiteLinkClusteringBuilder,
        LinkClustering, LinkClusteringBuilder, LinkClusteringResult, PartitionMap,
        StandardDensity, partition_density,
    },
    matrix::{DenseMatrix, Layout, Matrix, SparseMatrix},
    options::ClusteringOptions,
    parallel::{Cancellation, Parallelism},
    result::{Assignment, ClusterId, ClusteringResult, NonContiguousClusterIds},
    similarity::{DenseSimilarityMatrix, SimilarityMatrix, SimilarityMetric},
};
