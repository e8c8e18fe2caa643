//! Compressed sparse row storage.

use std::borrow::Cow;

use crate::error::MatrixError;

use super::{Layout, Matrix, out_of_bounds};

/// A sparse matrix stored in compressed sparse row (CSR) form.
///
/// Columns within each row are kept sorted and unique, so
/// [`Matrix::non_zero_columns`] borrows directly from storage.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseMatrix {
    rows: usize,
    columns: usize,
    row_offsets: Vec<usize>,
    column_indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseMatrix {
    /// Builds a matrix from `(row, column, value)` triplets.
    ///
    /// Zero values are dropped. When a cell appears more than once the last
    /// value wins.
    ///
    /// # Errors
    /// Returns [`MatrixError::OutOfBounds`] for cells outside `rows x columns`
    /// and [`MatrixError::NonFinite`] for NaN or infinite values.
    ///
    /// # Examples
    /// ```
    /// use plexus_core::{Matrix, SparseMatrix};
    ///
    /// let matrix = SparseMatrix::from_triplets(2, 3, [(1, 2, 4.0), (0, 1, 1.5), (1, 0, 0.0)])?;
    /// assert_eq!(matrix.get(1, 2)?, 4.0);
    /// assert_eq!(matrix.non_zero_columns(1)?.as_ref(), &[2]);
    /// # Ok::<(), plexus_core::MatrixError>(())
    /// ```
    pub fn from_triplets(
        rows: usize,
        columns: usize,
        triplets: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Result<Self, MatrixError> {
        let mut cells = Vec::new();
        for (sequence, (row, column, value)) in triplets.into_iter().enumerate() {
            if row >= rows || column >= columns {
                return Err(MatrixError::OutOfBounds {
                    row,
                    column,
                    rows,
                    columns,
                });
            }
            if !value.is_finite() {
                return Err(MatrixError::NonFinite { row, column });
            }
            cells.push((row, column, sequence, value));
        }

        cells.sort_unstable_by_key(|&(row, column, sequence, _)| (row, column, sequence));
        // Keep the last write for each cell.
        cells.dedup_by(|later, earlier| {
            let same = later.0 == earlier.0 && later.1 == earlier.1;
            if same {
                *earlier = *later;
            }
            same
        });

        let mut row_offsets = vec![0; rows + 1];
        let mut column_indices = Vec::with_capacity(cells.len());
        let mut values = Vec::with_capacity(cells.len());
        for (row, column, _, value) in cells {
            if value == 0.0 {
                continue;
            }
            row_offsets[row + 1] += 1;
            column_indices.push(column);
            values.push(value);
        }
        for row in 0..rows {
            row_offsets[row + 1] += row_offsets[row];
        }

        Ok(Self {
            rows,
            columns,
            row_offsets,
            column_indices,
            values,
        })
    }

    /// Builds a symmetric unweighted adjacency matrix over `nodes` nodes.
    ///
    /// Each pair `(a, b)` sets both `(a, b)` and `(b, a)` to `1.0`.
    ///
    /// # Errors
    /// Returns [`MatrixError::OutOfBounds`] when an endpoint is not below
    /// `nodes`.
    ///
    /// # Examples
    /// ```
    /// use plexus_core::{Matrix, SparseMatrix};
    ///
    /// let triangle = SparseMatrix::undirected(3, &[(0, 1), (1, 2), (2, 0)])?;
    /// assert_eq!(triangle.get(1, 0)?, 1.0);
    /// assert_eq!(triangle.stored_values(), 6);
    /// # Ok::<(), plexus_core::MatrixError>(())
    /// ```
    pub fn undirected(nodes: usize, pairs: &[(usize, usize)]) -> Result<Self, MatrixError> {
        Self::from_triplets(
            nodes,
            nodes,
            pairs
                .iter()
                .flat_map(|&(left, right)| [(left, right, 1.0), (right, left, 1.0)]),
        )
    }

    /// Returns the number of explicitly stored (non-zero) cells.
    #[must_use]
    pub fn stored_values(&self) -> usize {
        self.values.len()
    }

    fn row_range(&self, row: usize) -> Option<(usize, usize)> {
        let start = *self.row_offsets.get(row)?;
        let end = *self.row_offsets.get(row + 1)?;
        Some((start, end))
    }
}

impl Matrix for SparseMatrix {
    fn rows(&self) -> usize {
        self.rows
    }

    fn columns(&self) -> usize {
        self.columns
    }

    fn get(&self, row: usize, column: usize) -> Result<f64, MatrixError> {
        if column >= self.columns {
            return Err(out_of_bounds(self, row, column));
        }
        let (start, end) = self
            .row_range(row)
            .ok_or_else(|| out_of_bounds(self, row, column))?;
        Ok(self.column_indices[start..end]
            .binary_search(&column)
            .map_or(0.0, |offset| self.values[start + offset]))
    }

    fn non_zero_columns(&self, row: usize) -> Result<Cow<'_, [usize]>, MatrixError> {
        let (start, end) = self
            .row_range(row)
            .ok_or_else(|| out_of_bounds(self, row, 0))?;
        Ok(Cow::Borrowed(&self.column_indices[start..end]))
    }

    fn layout(&self) -> Layout {
        Layout::Sparse
    }
}
