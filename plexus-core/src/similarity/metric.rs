//! Vector similarity functions for point clustering.

use std::{fmt, str::FromStr};

use crate::error::OptionsError;

/// Similarity function applied to every pair of feature rows.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum SimilarityMetric {
    /// Cosine of the angle between the rows; zero vectors score `0`.
    #[default]
    Cosine,
    /// `1 / (1 + d)` where `d` is the Euclidean distance.
    Euclidean,
    /// Pearson correlation; constant rows score `0`.
    Pearson,
}

impl SimilarityMetric {
    /// Returns the option spelling of this metric.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::Pearson => "pearson",
        }
    }

    /// Computes the similarity of two equally sized vectors.
    ///
    /// # Examples
    /// ```
    /// use plexus_core::SimilarityMetric;
    ///
    /// let same = SimilarityMetric::Cosine.compute(&[1.0, 1.0], &[2.0, 2.0]);
    /// assert!((same - 1.0).abs() < 1e-12);
    /// let far = SimilarityMetric::Euclidean.compute(&[0.0, 0.0], &[3.0, 4.0]);
    /// assert!((far - 1.0 / 6.0).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn compute(self, left: &[f64], right: &[f64]) -> f64 {
        match self {
            Self::Cosine => cosine(left, right),
            Self::Euclidean => {
                let squared: f64 = left
                    .iter()
                    .zip(right)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                1.0 / (1.0 + squared.sqrt())
            }
            Self::Pearson => pearson(left, right),
        }
    }
}

fn cosine(left: &[f64], right: &[f64]) -> f64 {
    let (mut dot, mut left_squares, mut right_squares) = (0.0, 0.0, 0.0);
    for (a, b) in left.iter().zip(right) {
        dot += a * b;
        left_squares += a * a;
        right_squares += b * b;
    }
    let denominator = left_squares.sqrt() * right_squares.sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    // Rounding can push the ratio marginally outside [-1, 1].
    (dot / denominator).clamp(-1.0, 1.0)
}

fn pearson(left: &[f64], right: &[f64]) -> f64 {
    let count = left.len().min(right.len());
    if count == 0 {
        return 0.0;
    }
    let n = count as f64;
    let left_mean = left.iter().take(count).sum::<f64>() / n;
    let right_mean = right.iter().take(count).sum::<f64>() / n;
    let (mut covariance, mut left_variance, mut right_variance) = (0.0, 0.0, 0.0);
    for (a, b) in left.iter().zip(right) {
        let da = a - left_mean;
        let db = b - right_mean;
        covariance += da * db;
        left_variance += da * da;
        right_variance += db * db;
    }
    let denominator = (left_variance * right_variance).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        (covariance / denominator).clamp(-1.0, 1.0)
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimilarityMetric {
    type Err = OptionsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "euclidean" => Ok(Self::Euclidean),
            "pearson" => Ok(Self::Pearson),
            _ => Err(OptionsError::InvalidValue {
                key: "similarity_metric",
                value: raw.into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::orthogonal(&[1.0, 0.0], &[0.0, 1.0], 0.0)]
    #[case::opposite(&[1.0, 2.0], &[-1.0, -2.0], -1.0)]
    #[case::zero_vector(&[0.0, 0.0], &[1.0, 1.0], 0.0)]
    fn cosine_cases(#[case] left: &[f64], #[case] right: &[f64], #[case] expected: f64) {
        let value = SimilarityMetric::Cosine.compute(left, right);
        assert!((value - expected).abs() < 1e-12, "got {value}");
    }

    #[rstest]
    #[case::perfect(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0], 1.0)]
    #[case::inverse(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0], -1.0)]
    #[case::constant(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], 0.0)]
    fn pearson_cases(#[case] left: &[f64], #[case] right: &[f64], #[case] expected: f64) {
        let value = SimilarityMetric::Pearson.compute(left, right);
        assert!((value - expected).abs() < 1e-12, "got {value}");
    }

    #[test]
    fn euclidean_of_identical_rows_is_one() {
        assert_eq!(SimilarityMetric::Euclidean.compute(&[2.0, 5.0], &[2.0, 5.0]), 1.0);
    }

    #[rstest]
    #[case("cosine", SimilarityMetric::Cosine)]
    #[case(" Euclidean ", SimilarityMetric::Euclidean)]
    #[case("PEARSON", SimilarityMetric::Pearson)]
    fn parses_metric_names(#[case] raw: &str, #[case] expected: SimilarityMetric) {
        assert_eq!(raw.parse::<SimilarityMetric>().expect("known metric"), expected);
    }

    #[test]
    fn rejects_unknown_metric() {
        let err = "manhattan"
            .parse::<SimilarityMetric>()
            .expect_err("unknown metric");
        assert!(matches!(
            err,
            OptionsError::InvalidValue {
                key: "similarity_metric",
                ..
            }
        ));
    }
}
