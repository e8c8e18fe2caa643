//! Graph views used by link clustering.
//!
//! An adjacency [`Matrix`] is snapshotted once into an [`AdjacencyIndex`] of
//! sorted, weighted neighbour lists. Edges are then derived from it in
//! discovery order and compared pairwise by an [`EdgeSimilarity`] strategy.

mod edge_matrix;
mod edge_similarity;

use crate::{
    error::MatrixError,
    matrix::{Matrix, ensure_square},
};

pub use self::{
    edge_matrix::{EagerEdgeSimilarity, LazyEdgeSimilarity},
    edge_similarity::{
        EdgeSimilarity, JaccardEdgeSimilarity, KPartiteEdgeSimilarity, WeightedEdgeSimilarity,
    },
};

/// An undirected edge identified by its position in an [`EdgeList`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Edge {
    from: usize,
    to: usize,
}

impl Edge {
    /// Creates an edge between `from` and `to`.
    #[must_use]
    pub const fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    #[rustfmt::skip]
    /// Returns the node the edge was discovered from.
    #[must_use]
    pub const fn from(self) -> usize { self.from }

    #[rustfmt::skip]
    /// Returns the other endpoint.
    #[must_use]
    pub const fn to(self) -> usize { self.to }

    /// Returns both endpoints as a pair.
    #[must_use]
    pub const fn endpoints(self) -> (usize, usize) {
        (self.from, self.to)
    }
}

/// Owned snapshot of the sorted neighbour list of every node, with the
/// weight stored for each neighbour.
///
/// Parallel similarity tasks share the index read-only.
#[derive(Clone, Debug, PartialEq)]
pub struct AdjacencyIndex {
    neighbours: Vec<Vec<usize>>,
    weights: Vec<Vec<f64>>,
}

impl AdjacencyIndex {
    /// Snapshots the non-zero cells of every row of a square matrix.
    ///
    /// Rows that are not already ascending are sorted and de-duplicated.
    ///
    /// # Errors
    /// Returns [`MatrixError::NotSquare`] for rectangular matrices,
    /// [`MatrixError::NonFinite`] for NaN or infinite weights, and propagates
    /// errors raised while reading rows.
    pub fn from_matrix<M: Matrix + ?Sized>(matrix: &M) -> Result<Self, MatrixError> {
        ensure_square(matrix)?;
        let mut neighbours = Vec::with_capacity(matrix.rows());
        let mut weights = Vec::with_capacity(matrix.rows());
        for row in 0..matrix.rows() {
            let mut cells = matrix
                .non_zero_columns(row)?
                .iter()
                .map(|&column| match matrix.get(row, column)? {
                    weight if weight.is_finite() => Ok((column, weight)),
                    _ => Err(MatrixError::NonFinite { row, column }),
                })
                .collect::<Result<Vec<_>, MatrixError>>()?;
            if !cells.windows(2).all(|pair| pair[0].0 < pair[1].0) {
                cells.sort_unstable_by_key(|&(column, _)| column);
                cells.dedup_by_key(|&mut (column, _)| column);
            }
            let (columns, values): (Vec<usize>, Vec<f64>) = cells.into_iter().unzip();
            neighbours.push(columns);
            weights.push(values);
        }
        Ok(Self {
            neighbours,
            weights,
        })
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.neighbours.len()
    }

    /// Returns the ascending neighbours of `node`, or an empty slice when the
    /// node does not exist.
    #[must_use]
    pub fn neighbours(&self, node: usize) -> &[usize] {
        self.neighbours.get(node).map_or(&[], Vec::as_slice)
    }

    /// Returns the weights of `node`'s cells, aligned with
    /// [`Self::neighbours`].
    #[must_use]
    pub fn weights(&self, node: usize) -> &[f64] {
        self.weights.get(node).map_or(&[], Vec::as_slice)
    }

    /// Returns the weight of cell `(row, column)`, if it is non-zero.
    #[must_use]
    pub fn weight(&self, row: usize, column: usize) -> Option<f64> {
        let index = self.neighbours(row).binary_search(&column).ok()?;
        self.weights(row).get(index).copied()
    }

    /// Returns whether `row` has a non-zero cell in `column`.
    #[must_use]
    pub fn contains(&self, row: usize, column: usize) -> bool {
        self.neighbours(row).binary_search(&column).is_ok()
    }
}

/// Edges of a graph in discovery order; an edge's id is its index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdgeList {
    edges: Vec<Edge>,
    node_count: usize,
}

impl EdgeList {
    /// Derives the edges of a square adjacency matrix.
    ///
    /// # Errors
    /// Returns [`MatrixError::NotSquare`] for rectangular matrices and
    /// propagates errors raised while reading rows.
    ///
    /// # Examples
    /// ```
    /// use plexus_core::{Edge, EdgeList, SparseMatrix};
    ///
    /// // Only the upper triangle is stored, so the edge is found from row 0.
    /// let adjacency = SparseMatrix::from_triplets(3, 3, [(0, 1, 1.0), (2, 1, 1.0)])?;
    /// let edges = EdgeList::from_adjacency(&adjacency)?;
    /// assert_eq!(edges.as_slice(), &[Edge::new(0, 1), Edge::new(2, 1)]);
    /// # Ok::<(), plexus_core::MatrixError>(())
    /// ```
    pub fn from_adjacency<M: Matrix + ?Sized>(matrix: &M) -> Result<Self, MatrixError> {
        Ok(Self::from_index(&AdjacencyIndex::from_matrix(matrix)?))
    }

    /// Derives edges row by row from an adjacency snapshot.
    ///
    /// For row `r` and neighbour `c`, `(r, c)` is emitted when `r > c`, and
    /// when `r < c` only if `(c, r)` is absent. Self-loops are skipped, so each
    /// undirected edge appears once whichever triangle stores it.
    #[must_use]
    pub fn from_index(adjacency: &AdjacencyIndex) -> Self {
        let mut edges = Vec::new();
        for row in 0..adjacency.node_count() {
            for &column in adjacency.neighbours(row) {
                let emit = match row.cmp(&column) {
                    std::cmp::Ordering::Greater => true,
                    std::cmp::Ordering::Less => !adjacency.contains(column, row),
                    std::cmp::Ordering::Equal => false,
                };
                if emit {
                    edges.push(Edge::new(row, column));
                }
            }
        }
        Self {
            edges,
            node_count: adjacency.node_count(),
        }
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns whether the graph has no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Returns the number of nodes of the source graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Returns the edge with the given id.
    #[must_use]
    pub fn get(&self, id: usize) -> Option<Edge> {
        self.edges.get(id).copied()
    }

    /// Returns every edge ordered by id.
    #[must_use]
    pub fn as_slice(&self) -> &[Edge] {
        &self.edges
    }

    /// Iterates over the edges in id order.
    pub fn iter(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges.iter().copied()
    }
}

#[cfg(test)]
mod tests;
