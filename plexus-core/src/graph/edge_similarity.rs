//! Edge-to-edge similarity strategies.

use super::{AdjacencyIndex, Edge};

/// Scores how similar two edges are for link clustering.
///
/// Implementations are shared read-only across similarity-fill tasks and must
/// be symmetric in `left` and `right`.
pub trait EdgeSimilarity: Send + Sync {
    /// Returns the similarity of `left` and `right` over `adjacency`.
    fn similarity(&self, adjacency: &AdjacencyIndex, left: Edge, right: Edge) -> f64;
}

impl<S: EdgeSimilarity + ?Sized> EdgeSimilarity for &S {
    fn similarity(&self, adjacency: &AdjacencyIndex, left: Edge, right: Edge) -> f64 {
        (**self).similarity(adjacency, left, right)
    }
}

/// Finds the keystone node shared by two edges and returns their imposts.
///
/// The imposts are the endpoints that are not shared, returned in
/// `(left, right)` order. Edges without a common node yield `None`.
pub(crate) fn shared_endpoint(left: Edge, right: Edge) -> Option<(usize, usize)> {
    let (a, b) = left.endpoints();
    let (c, d) = right.endpoints();
    if a == c {
        Some((b, d))
    } else if a == d {
        Some((b, c))
    } else if b == c {
        Some((a, d))
    } else if b == d {
        Some((a, c))
    } else {
        None
    }
}

/// Counts the values present in both ascending slices.
fn intersection_len(left: &[usize], right: &[usize]) -> usize {
    let (mut i, mut j, mut shared) = (0, 0, 0);
    while i < left.len() && j < right.len() {
        match left[i].cmp(&right[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                shared += 1;
                i += 1;
                j += 1;
            }
        }
    }
    shared
}

fn ratio(shared: usize, union: usize) -> f64 {
    if union == 0 {
        0.0
    } else {
        shared as f64 / union as f64
    }
}

/// Jaccard index of the inclusive neighbourhoods `N(i) ∪ {i}` of the impost
/// nodes of two adjacent edges; non-adjacent edges score `0`.
///
/// # Examples
/// ```
/// use plexus_core::{AdjacencyIndex, Edge, EdgeSimilarity, JaccardEdgeSimilarity, SparseMatrix};
///
/// let graph = SparseMatrix::undirected(3, &[(0, 1), (1, 2), (0, 2)])?;
/// let adjacency = AdjacencyIndex::from_matrix(&graph)?;
/// let score = JaccardEdgeSimilarity.similarity(&adjacency, Edge::new(1, 0), Edge::new(2, 1));
/// assert_eq!(score, 1.0);
/// # Ok::<(), plexus_core::MatrixError>(())
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct JaccardEdgeSimilarity;

impl EdgeSimilarity for JaccardEdgeSimilarity {
    fn similarity(&self, adjacency: &AdjacencyIndex, left: Edge, right: Edge) -> f64 {
        let Some((first, second)) = shared_endpoint(left, right) else {
            return 0.0;
        };
        if first == second {
            return 1.0;
        }
        let first_neighbours = adjacency.neighbours(first);
        let second_neighbours = adjacency.neighbours(second);
        let first_has_self = first_neighbours.binary_search(&first).is_ok();
        let second_has_self = second_neighbours.binary_search(&second).is_ok();

        // Each impost joins its own set; count it as shared when the other
        // impost neighbours it.
        let mut shared = intersection_len(first_neighbours, second_neighbours);
        if !first_has_self && second_neighbours.binary_search(&first).is_ok() {
            shared += 1;
        }
        if !second_has_self && first_neighbours.binary_search(&second).is_ok() {
            shared += 1;
        }
        let first_len = first_neighbours.len() + usize::from(!first_has_self);
        let second_len = second_neighbours.len() + usize::from(!second_has_self);
        ratio(shared, first_len + second_len - shared)
    }
}

/// Jaccard index of the exclusive neighbourhoods `N(i)` of the impost nodes.
///
/// In a k-partite graph the imposts of two adjacent edges usually share a
/// partition and are never adjacent to each other, so their own membership is
/// left out.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct KPartiteEdgeSimilarity;

impl EdgeSimilarity for KPartiteEdgeSimilarity {
    fn similarity(&self, adjacency: &AdjacencyIndex, left: Edge, right: Edge) -> f64 {
        let Some((first, second)) = shared_endpoint(left, right) else {
            return 0.0;
        };
        let first_neighbours = adjacency.neighbours(first);
        let second_neighbours = adjacency.neighbours(second);
        let shared = intersection_len(first_neighbours, second_neighbours);
        ratio(
            shared,
            first_neighbours.len() + second_neighbours.len() - shared,
        )
    }
}

/// Extended Tanimoto coefficient of the impost nodes' weight vectors.
///
/// A node's vector holds its positive edge weights divided by its number of
/// positive neighbours, plus an entry for the node itself equal to the
/// reciprocal of that count. Nodes without positive weights have the zero
/// vector, and any pair involving one scores `0`.
///
/// # Examples
/// ```
/// use plexus_core::{AdjacencyIndex, Edge, EdgeSimilarity, SparseMatrix, WeightedEdgeSimilarity};
///
/// // Both leaves of the star only reach the centre with weight 2.
/// let graph = SparseMatrix::from_triplets(
///     3,
///     3,
///     [(0, 1, 2.0), (1, 0, 2.0), (0, 2, 2.0), (2, 0, 2.0)],
/// )?;
/// let adjacency = AdjacencyIndex::from_matrix(&graph)?;
/// let score = WeightedEdgeSimilarity.similarity(&adjacency, Edge::new(1, 0), Edge::new(2, 0));
/// // {0: 2, 1: 1} against {0: 2, 2: 1}: 4 / (5 + 5 - 4).
/// assert!((score - 4.0 / 6.0).abs() < 1e-12);
/// # Ok::<(), plexus_core::MatrixError>(())
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct WeightedEdgeSimilarity;

impl EdgeSimilarity for WeightedEdgeSimilarity {
    fn similarity(&self, adjacency: &AdjacencyIndex, left: Edge, right: Edge) -> f64 {
        let Some((first, second)) = shared_endpoint(left, right) else {
            return 0.0;
        };
        let (Some(first), Some(second)) = (
            WeightVector::of(adjacency, first),
            WeightVector::of(adjacency, second),
        ) else {
            return 0.0;
        };
        let dot = dot(first.entries(), second.entries());
        let denominator = first.norm_squared() + second.norm_squared() - dot;
        if denominator > 0.0 {
            dot / denominator
        } else {
            0.0
        }
    }
}

/// Normalised positive weights of one node, read straight from the index.
struct WeightVector<'a> {
    node: usize,
    columns: &'a [usize],
    weights: &'a [f64],
    scale: f64,
}

impl<'a> WeightVector<'a> {
    fn of(adjacency: &'a AdjacencyIndex, node: usize) -> Option<Self> {
        let weights = adjacency.weights(node);
        let positive = weights.iter().filter(|&&weight| weight > 0.0).count();
        (positive > 0).then(|| Self {
            node,
            columns: adjacency.neighbours(node),
            weights,
            scale: 1.0 / positive as f64,
        })
    }

    fn positive(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.columns
            .iter()
            .zip(self.weights)
            .filter(|&(&column, &weight)| weight > 0.0 && column != self.node)
            .map(|(&column, &weight)| (column, weight * self.scale))
    }

    /// Entries in ascending column order, the node's own entry included.
    fn entries(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.positive()
            .filter(|&(column, _)| column < self.node)
            .chain(std::iter::once((self.node, self.scale)))
            .chain(self.positive().filter(|&(column, _)| column > self.node))
    }

    fn norm_squared(&self) -> f64 {
        self.entries().map(|(_, value)| value * value).sum()
    }
}

/// Dot product of two sparse vectors given in ascending column order.
fn dot(
    left: impl Iterator<Item = (usize, f64)>,
    right: impl Iterator<Item = (usize, f64)>,
) -> f64 {
    let mut left = left.peekable();
    let mut right = right.peekable();
    let mut sum = 0.0;
    while let (Some(&(i, a)), Some(&(j, b))) = (left.peek(), right.peek()) {
        match i.cmp(&j) {
            std::cmp::Ordering::Less => {
                left.next();
            }
            std::cmp::Ordering::Greater => {
                right.next();
            }
            std::cmp::Ordering::Equal => {
                sum += a * b;
                left.next();
                right.next();
            }
        }
    }
    sum
}
