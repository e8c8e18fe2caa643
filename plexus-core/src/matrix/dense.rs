//! Row-major dense storage for feature matrices.

use std::borrow::Cow;

use crate::error::MatrixError;

use super::{Layout, Matrix, out_of_bounds};

/// A dense row-major matrix, typically holding one feature vector per row.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseMatrix {
    rows: usize,
    columns: usize,
    values: Vec<f64>,
}

impl DenseMatrix {
    /// Builds a matrix from equally sized rows.
    ///
    /// # Errors
    /// Returns [`MatrixError::RaggedRow`] when a row length differs from the
    /// first row and [`MatrixError::NonFinite`] for NaN or infinite values.
    ///
    /// # Examples
    /// ```
    /// use plexus_core::{DenseMatrix, Matrix};
    ///
    /// let features = DenseMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 2.0]])?;
    /// assert_eq!(features.rows(), 2);
    /// assert_eq!(features.non_zero_columns(1)?.as_ref(), &[1]);
    /// # Ok::<(), plexus_core::MatrixError>(())
    /// ```
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, MatrixError> {
        let columns = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(rows.len() * columns);
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != columns {
                return Err(MatrixError::RaggedRow {
                    row,
                    found: cells.len(),
                    expected: columns,
                });
            }
            if let Some(column) = cells.iter().position(|value| !value.is_finite()) {
                return Err(MatrixError::NonFinite { row, column });
            }
            values.extend_from_slice(cells);
        }
        Ok(Self {
            rows: rows.len(),
            columns,
            values,
        })
    }
}

impl Matrix for DenseMatrix {
    fn rows(&self) -> usize {
        self.rows
    }

    fn columns(&self) -> usize {
        self.columns
    }

    fn get(&self, row: usize, column: usize) -> Result<f64, MatrixError> {
        if row >= self.rows || column >= self.columns {
            return Err(out_of_bounds(self, row, column));
        }
        Ok(self.values[row * self.columns + column])
    }

    fn non_zero_columns(&self, row: usize) -> Result<Cow<'_, [usize]>, MatrixError> {
        let cells = self.row(row)?;
        Ok(Cow::Owned(
            cells
                .iter()
                .enumerate()
                .filter_map(|(column, &value)| (value != 0.0).then_some(column))
                .collect(),
        ))
    }

    fn layout(&self) -> Layout {
        Layout::Dense
    }

    fn row(&self, row: usize) -> Result<Cow<'_, [f64]>, MatrixError> {
        if row >= self.rows {
            return Err(out_of_bounds(self, row, 0));
        }
        let start = row * self.columns;
        Ok(Cow::Borrowed(&self.values[start..start + self.columns]))
    }
}
