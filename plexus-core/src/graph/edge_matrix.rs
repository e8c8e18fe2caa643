//! Edge similarity matrices, computed up front or on demand.

use std::fmt;

use tracing::{debug, instrument};

use crate::{
    error::{ClusteringError, ParallelRegion, Result},
    parallel::Workers,
    similarity::SimilarityMatrix,
};

use super::{AdjacencyIndex, EdgeList, EdgeSimilarity};

/// Edge similarities computed once and kept in memory.
///
/// Row `i` stores the positive similarities to edges `j > i`, ascending by
/// `j`. Absent pairs score `0`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EagerEdgeSimilarity {
    rows: Vec<Vec<(usize, f64)>>,
}

impl EagerEdgeSimilarity {
    /// Computes every pairwise edge similarity on the ambient rayon pool.
    ///
    /// # Errors
    /// Returns [`ClusteringError::TaskFailures`] listing every row that
    /// produced a non-finite similarity.
    ///
    /// # Examples
    /// ```
    /// use plexus_core::{
    ///     AdjacencyIndex, EagerEdgeSimilarity, EdgeList, JaccardEdgeSimilarity, SimilarityMatrix,
    ///     SparseMatrix,
    /// };
    ///
    /// let graph = SparseMatrix::undirected(4, &[(0, 1), (1, 2), (2, 3)])?;
    /// let adjacency = AdjacencyIndex::from_matrix(&graph)?;
    /// let edges = EdgeList::from_index(&adjacency);
    /// let matrix = EagerEdgeSimilarity::build(&edges, &adjacency, &JaccardEdgeSimilarity)?;
    /// assert_eq!(matrix.len(), 3);
    /// assert_eq!(matrix.similarity(0, 2), 0.0);
    /// assert!(matrix.similarity(0, 1) > 0.0);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn build<S: EdgeSimilarity + ?Sized>(
        edges: &EdgeList,
        adjacency: &AdjacencyIndex,
        similarity: &S,
    ) -> Result<Self> {
        Self::fill(edges, adjacency, similarity, &Workers::default())
    }

    /// Fills one row per task; every task only reads the snapshot.
    #[instrument(
        name = "link.similarity_fill",
        err,
        skip(edges, adjacency, similarity, workers),
        fields(edges = edges.len()),
    )]
    pub(crate) fn fill<S: EdgeSimilarity + ?Sized>(
        edges: &EdgeList,
        adjacency: &AdjacencyIndex,
        similarity: &S,
        workers: &Workers,
    ) -> Result<Self> {
        let all = edges.as_slice();
        let rows = workers.fork_join(ParallelRegion::SimilarityFill, all.len(), |left| {
            let edge = all[left];
            let mut row = Vec::new();
            for (offset, &other) in all[left + 1..].iter().enumerate() {
                let right = left + 1 + offset;
                let value = similarity.similarity(adjacency, edge, other);
                if !value.is_finite() {
                    return Err(ClusteringError::NonFiniteSimilarity { left, right });
                }
                if value > 0.0 {
                    row.push((right, value));
                }
            }
            Ok(row)
        })?;
        let stored: usize = rows.iter().map(Vec::len).sum();
        debug!(edges = all.len(), stored, "edge similarity matrix filled");
        Ok(Self { rows })
    }

    /// Returns the number of positive similarities held.
    #[must_use]
    pub fn stored_values(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

impl SimilarityMatrix for EagerEdgeSimilarity {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn similarity(&self, left: usize, right: usize) -> f64 {
        if left == right {
            return 1.0;
        }
        let (low, high) = if left < right { (left, right) } else { (right, left) };
        let row = &self.rows[low];
        row.binary_search_by_key(&high, |&(column, _)| column)
            .map_or(0.0, |index| row[index].1)
    }
}

/// Edge similarities recomputed on every query.
///
/// Trades repeated work for memory: nothing beyond the edge list and the
/// adjacency snapshot is kept.
pub struct LazyEdgeSimilarity<'a, S: ?Sized> {
    edges: &'a EdgeList,
    adjacency: &'a AdjacencyIndex,
    similarity: &'a S,
}

impl<'a, S: EdgeSimilarity + ?Sized> LazyEdgeSimilarity<'a, S> {
    /// Wraps the inputs without computing anything.
    #[must_use]
    pub fn new(edges: &'a EdgeList, adjacency: &'a AdjacencyIndex, similarity: &'a S) -> Self {
        Self {
            edges,
            adjacency,
            similarity,
        }
    }
}

impl<S: ?Sized> fmt::Debug for LazyEdgeSimilarity<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyEdgeSimilarity")
            .field("edges", &self.edges.len())
            .field("nodes", &self.adjacency.node_count())
            .finish_non_exhaustive()
    }
}

impl<S: EdgeSimilarity + ?Sized> SimilarityMatrix for LazyEdgeSimilarity<'_, S> {
    fn len(&self) -> usize {
        self.edges.len()
    }

    fn similarity(&self, left: usize, right: usize) -> f64 {
        if left == right {
            return 1.0;
        }
        match (self.edges.get(left), self.edges.get(right)) {
            (Some(first), Some(second)) => self.similarity.similarity(self.adjacency, first, second),
            _ => 0.0,
        }
    }
}
