//! Pairwise similarity matrices consumed by the agglomerative engine.

mod dense;
mod metric;

pub use self::{dense::DenseSimilarityMatrix, metric::SimilarityMetric};

/// A symmetric similarity lookup over `len()` comparable units.
///
/// Implementations must satisfy `similarity(i, j) == similarity(j, i)`.
/// Values are not required to lie in `[0, 1]`, but the agglomerative engine
/// rejects non-finite ones.
///
/// # Examples
/// ```
/// use plexus_core::{DenseSimilarityMatrix, SimilarityMatrix};
///
/// let matrix = DenseSimilarityMatrix::from_fn(3, |i, j| if i + j == 1 { 0.9 } else { 0.1 });
/// assert_eq!(matrix.len(), 3);
/// assert_eq!(matrix.similarity(1, 0), 0.9);
/// assert_eq!(matrix.similarity(2, 0), 0.1);
/// ```
pub trait SimilarityMatrix {
    /// Returns the number of units being compared.
    fn len(&self) -> usize;

    /// Returns whether the matrix compares no units.
    #[must_use]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the similarity of units `left` and `right`.
    fn similarity(&self, left: usize, right: usize) -> f64;
}

impl<T: SimilarityMatrix + ?Sized> SimilarityMatrix for &T {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn similarity(&self, left: usize, right: usize) -> f64 {
        (**self).similarity(left, right)
    }
}
