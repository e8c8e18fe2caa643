//! Dense pairwise similarity storage for point clustering.

use tracing::{debug, instrument};

use crate::{
    error::{ClusteringError, ParallelRegion, Result},
    matrix::Matrix,
    parallel::Workers,
};

use super::{SimilarityMatrix, SimilarityMetric};

/// Dense symmetric similarity matrix storing the strict upper triangle.
///
/// The diagonal is implicitly `1.0`.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseSimilarityMatrix {
    len: usize,
    upper: Vec<f64>,
}

impl DenseSimilarityMatrix {
    /// Builds a matrix by evaluating `similarity(i, j)` for every `i < j`.
    ///
    /// # Examples
    /// ```
    /// use plexus_core::{DenseSimilarityMatrix, SimilarityMatrix};
    ///
    /// let matrix = DenseSimilarityMatrix::from_fn(4, |i, j| 1.0 / (1 + j - i) as f64);
    /// assert_eq!(matrix.similarity(3, 1), 1.0 / 3.0);
    /// assert_eq!(matrix.similarity(2, 2), 1.0);
    /// ```
    #[must_use]
    pub fn from_fn(len: usize, mut similarity: impl FnMut(usize, usize) -> f64) -> Self {
        let mut upper = Vec::with_capacity(triangle_len(len));
        for left in 0..len {
            for right in (left + 1)..len {
                upper.push(similarity(left, right));
            }
        }
        Self { len, upper }
    }

    /// Builds a matrix from a full row-major `len x len` array.
    ///
    /// Only the strict upper triangle is read.
    ///
    /// # Errors
    /// Returns [`ClusteringError::SimilarityShape`] when `values` does not hold
    /// `len * len` entries and [`ClusteringError::NonFiniteSimilarity`] when an
    /// upper-triangle entry is NaN or infinite.
    pub fn from_square(len: usize, values: &[f64]) -> Result<Self> {
        let expected = len * len;
        if values.len() != expected {
            return Err(ClusteringError::SimilarityShape {
                len: values.len(),
                expected,
            });
        }
        let mut upper = Vec::with_capacity(triangle_len(len));
        for left in 0..len {
            for right in (left + 1)..len {
                let value = values[left * len + right];
                if !value.is_finite() {
                    return Err(ClusteringError::NonFiniteSimilarity { left, right });
                }
                upper.push(value);
            }
        }
        Ok(Self { len, upper })
    }

    /// Applies `metric` to every pair of rows of `matrix`.
    ///
    /// Rows are filled in parallel on the ambient rayon pool.
    ///
    /// # Errors
    /// Propagates [`crate::MatrixError`]s raised while reading rows and returns
    /// [`ClusteringError::TaskFailures`] when any pair scores a non-finite
    /// value.
    pub fn from_rows<M: Matrix + ?Sized>(matrix: &M, metric: SimilarityMetric) -> Result<Self> {
        Self::fill(matrix, metric, &Workers::default())
    }

    /// Runs the row fill through `workers`, one task per row.
    #[instrument(
        name = "similarity.point_fill",
        err,
        skip(matrix, metric, workers),
        fields(rows = matrix.rows(), metric = %metric),
    )]
    pub(crate) fn fill<M: Matrix + ?Sized>(
        matrix: &M,
        metric: SimilarityMetric,
        workers: &Workers,
    ) -> Result<Self> {
        let len = matrix.rows();
        let rows = (0..len)
            .map(|row| matrix.row(row).map(|cells| cells.into_owned()))
            .collect::<core::result::Result<Vec<_>, _>>()?;

        let filled = workers.fork_join(ParallelRegion::SimilarityFill, len, |left| {
            let row = &rows[left];
            rows[left + 1..]
                .iter()
                .enumerate()
                .map(|(offset, other)| {
                    let value = metric.compute(row, other);
                    if value.is_finite() {
                        Ok(value)
                    } else {
                        Err(ClusteringError::NonFiniteSimilarity {
                            left,
                            right: left + 1 + offset,
                        })
                    }
                })
                .collect::<Result<Vec<f64>>>()
        })?;

        let upper: Vec<f64> = filled.into_iter().flatten().collect();
        debug!(pairs = upper.len(), "point similarity matrix filled");
        Ok(Self { len, upper })
    }

    fn offset(&self, left: usize, right: usize) -> usize {
        // Rows before `left` contribute (len - 1) + (len - 2) + ... entries.
        left * self.len - left * (left + 1) / 2 + (right - left - 1)
    }
}

fn triangle_len(len: usize) -> usize {
    len * len.saturating_sub(1) / 2
}

impl SimilarityMatrix for DenseSimilarityMatrix {
    fn len(&self) -> usize {
        self.len
    }

    fn similarity(&self, left: usize, right: usize) -> f64 {
        match left.cmp(&right) {
            std::cmp::Ordering::Equal => 1.0,
            std::cmp::Ordering::Less => self.upper[self.offset(left, right)],
            std::cmp::Ordering::Greater => self.upper[self.offset(right, left)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    use crate::{matrix::DenseMatrix, parallel::Workers};

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(5)]
    fn from_fn_round_trips_every_pair(#[case] len: usize) {
        let matrix = DenseSimilarityMatrix::from_fn(len, |i, j| (i * 10 + j) as f64);
        for i in 0..len {
            for j in (i + 1)..len {
                assert_eq!(matrix.similarity(i, j), (i * 10 + j) as f64);
                assert_eq!(matrix.similarity(j, i), (i * 10 + j) as f64);
            }
        }
    }

    #[test]
    fn from_square_reads_upper_triangle() {
        let values = [
            1.0, 0.2, 0.3, //
            9.0, 1.0, 0.4, //
            9.0, 9.0, 1.0,
        ];
        let matrix = DenseSimilarityMatrix::from_square(3, &values).expect("3x3 values");
        assert_eq!(matrix.similarity(2, 1), 0.4);
        assert_eq!(matrix.similarity(1, 0), 0.2);
    }

    #[test]
    fn from_square_rejects_wrong_shape() {
        let err = DenseSimilarityMatrix::from_square(2, &[1.0, 0.5, 0.5])
            .expect_err("three values cannot fill 2x2");
        assert_eq!(err, ClusteringError::SimilarityShape { len: 3, expected: 4 });
    }

    #[test]
    fn from_rows_matches_metric() {
        let features = DenseMatrix::from_rows(vec![
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 1.0],
        ])
        .expect("rectangular rows");
        let matrix = DenseSimilarityMatrix::fill(
            &features,
            SimilarityMetric::Cosine,
            &Workers::default(),
        )
        .expect("fill succeeds");
        assert!((matrix.similarity(0, 2)).abs() < 1e-12);
        assert!((matrix.similarity(0, 1) - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }
}
