//! Matrix abstractions consumed by the clustering pipelines.
//!
//! Point clustering reads feature rows; link clustering reads an adjacency
//! matrix whose non-zero cells denote edges. Both go through [`Matrix`].

mod dense;
mod sparse;

use std::borrow::Cow;

use crate::error::MatrixError;

pub use self::{dense::DenseMatrix, sparse::SparseMatrix};

/// Storage layout reported by a [`Matrix`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Layout {
    /// Every cell is stored explicitly.
    Dense,
    /// Only non-zero cells are stored.
    Sparse,
}

/// Read access to a numeric matrix.
///
/// [`Matrix::non_zero_columns`] must return column indices in strictly
/// ascending order. Edge similarity relies on this to intersect neighbour
/// lists without sorting.
///
/// # Examples
/// ```
/// use plexus_core::{Layout, Matrix, SparseMatrix};
///
/// let adjacency = SparseMatrix::undirected(3, &[(0, 1), (1, 2)])?;
/// assert_eq!(adjacency.rows(), 3);
/// assert_eq!(adjacency.layout(), Layout::Sparse);
/// assert_eq!(adjacency.non_zero_columns(1)?.as_ref(), &[0, 2]);
/// assert_eq!(adjacency.get(0, 2)?, 0.0);
/// # Ok::<(), plexus_core::MatrixError>(())
/// ```
pub trait Matrix {
    /// Returns the number of rows.
    fn rows(&self) -> usize;

    /// Returns the number of columns.
    fn columns(&self) -> usize;

    /// Reads a single cell.
    ///
    /// # Errors
    /// Returns [`MatrixError::OutOfBounds`] for cells outside the matrix.
    fn get(&self, row: usize, column: usize) -> Result<f64, MatrixError>;

    /// Returns the ascending column indices of the non-zero cells in `row`.
    ///
    /// # Errors
    /// Returns [`MatrixError::OutOfBounds`] when `row` does not exist.
    fn non_zero_columns(&self, row: usize) -> Result<Cow<'_, [usize]>, MatrixError>;

    /// Reports how the matrix stores its cells.
    fn layout(&self) -> Layout;

    /// Returns every value of `row`.
    ///
    /// The default implementation reads each cell through [`Matrix::get`].
    ///
    /// # Errors
    /// Returns [`MatrixError::OutOfBounds`] when `row` does not exist.
    fn row(&self, row: usize) -> Result<Cow<'_, [f64]>, MatrixError> {
        (0..self.columns())
            .map(|column| self.get(row, column))
            .collect::<Result<Vec<_>, _>>()
            .map(Cow::Owned)
    }

    /// Returns whether the matrix has as many rows as columns.
    #[must_use]
    fn is_square(&self) -> bool {
        self.rows() == self.columns()
    }
}

pub(crate) fn out_of_bounds<M: Matrix + ?Sized>(
    matrix: &M,
    row: usize,
    column: usize,
) -> MatrixError {
    MatrixError::OutOfBounds {
        row,
        column,
        rows: matrix.rows(),
        columns: matrix.columns(),
    }
}

/// Rejects matrices that are not square.
pub(crate) fn ensure_square<M: Matrix + ?Sized>(matrix: &M) -> Result<(), MatrixError> {
    if matrix.is_square() {
        Ok(())
    } else {
        Err(MatrixError::NotSquare {
            rows: matrix.rows(),
            columns: matrix.columns(),
        })
    }
}
