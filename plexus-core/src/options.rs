//! String-keyed clustering options.
//!
//! Callers that receive configuration as key/value pairs (property files,
//! command lines, environment) parse them once into [`ClusteringOptions`] and
//! hand the result to a builder. Unknown keys and malformed values are
//! rejected up front.

use std::str::FromStr;

use crate::{
    error::OptionsError,
    hac::{Linkage, StopRule},
    similarity::SimilarityMetric,
};

/// Parsed clustering options; unset fields fall back to builder defaults.
///
/// # Examples
/// ```
/// use plexus_core::{ClusteringOptions, Linkage, StopRule};
///
/// let options = ClusteringOptions::parse([
///     ("linkage", "mean"),
///     ("similarity_threshold", "0.25"),
/// ])?;
/// assert_eq!(options.linkage(), Some(Linkage::Mean));
/// assert_eq!(options.stop_rule(), Some(StopRule::Threshold(0.25)));
/// # Ok::<(), plexus_core::OptionsError>(())
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClusteringOptions {
    linkage: Option<Linkage>,
    similarity_threshold: Option<f64>,
    target_cluster_count: Option<usize>,
    keep_similarity_matrix_in_memory: Option<bool>,
    similarity_metric: Option<SimilarityMetric>,
}

impl ClusteringOptions {
    /// Parses recognised `(key, value)` pairs. Later duplicates win.
    ///
    /// # Errors
    /// Returns [`OptionsError::UnknownKey`] for unrecognised keys,
    /// [`OptionsError::InvalidValue`] for malformed values, and
    /// [`OptionsError::ConflictingStopRules`] when both a threshold and a
    /// target cluster count are supplied.
    pub fn parse<I, K, V>(pairs: I) -> Result<Self, OptionsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            let raw = value.as_ref();
            match key.as_ref().trim() {
                "linkage" => options.linkage = Some(raw.parse()?),
                "similarity_threshold" => {
                    let threshold: f64 = parse_value("similarity_threshold", raw)?;
                    if threshold.is_nan() {
                        return Err(invalid("similarity_threshold", raw));
                    }
                    options.similarity_threshold = Some(threshold);
                }
                "target_cluster_count" => {
                    let target: usize = parse_value("target_cluster_count", raw)?;
                    if target == 0 {
                        return Err(invalid("target_cluster_count", raw));
                    }
                    options.target_cluster_count = Some(target);
                }
                "keep_similarity_matrix_in_memory" => {
                    options.keep_similarity_matrix_in_memory =
                        Some(parse_flag("keep_similarity_matrix_in_memory", raw)?);
                }
                "similarity_metric" => options.similarity_metric = Some(raw.parse()?),
                other => {
                    return Err(OptionsError::UnknownKey {
                        key: other.into(),
                    });
                }
            }
        }
        if options.similarity_threshold.is_some() && options.target_cluster_count.is_some() {
            return Err(OptionsError::ConflictingStopRules);
        }
        Ok(options)
    }

    #[rustfmt::skip]
    /// Returns the requested linkage.
    #[must_use]
    pub const fn linkage(&self) -> Option<Linkage> { self.linkage }

    #[rustfmt::skip]
    /// Returns the requested similarity metric for point clustering.
    #[must_use]
    pub const fn similarity_metric(&self) -> Option<SimilarityMetric> { self.similarity_metric }

    /// Returns whether edge similarities should be computed up front.
    #[must_use]
    pub const fn keep_similarity_matrix_in_memory(&self) -> Option<bool> {
        self.keep_similarity_matrix_in_memory
    }

    #[rustfmt::skip]
    /// Returns the requested target cluster count.
    #[must_use]
    pub const fn target_cluster_count(&self) -> Option<usize> { self.target_cluster_count }

    /// Returns the stop rule implied by the threshold or target count.
    #[must_use]
    pub fn stop_rule(&self) -> Option<StopRule> {
        self.similarity_threshold
            .map(StopRule::Threshold)
            .or(self.target_cluster_count.map(StopRule::TargetClusters))
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, OptionsError> {
    raw.trim().parse().map_err(|_| invalid(key, raw))
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, OptionsError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(invalid(key, raw)),
    }
}

fn invalid(key: &'static str, raw: &str) -> OptionsError {
    OptionsError::InvalidValue {
        key,
        value: raw.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[test]
    fn empty_input_leaves_everything_unset() {
        let options = ClusteringOptions::parse(Vec::<(String, String)>::new()).expect("no pairs");
        assert_eq!(options, ClusteringOptions::default());
        assert_eq!(options.stop_rule(), None);
    }

    #[test]
    fn parses_every_recognised_key() {
        let options = ClusteringOptions::parse([
            ("linkage", "single"),
            ("target_cluster_count", "3"),
            ("keep_similarity_matrix_in_memory", "false"),
            ("similarity_metric", "pearson"),
        ])
        .expect("valid options");
        assert_eq!(options.linkage(), Some(Linkage::Single));
        assert_eq!(options.stop_rule(), Some(StopRule::TargetClusters(3)));
        assert_eq!(options.keep_similarity_matrix_in_memory(), Some(false));
        assert_eq!(options.similarity_metric(), Some(SimilarityMetric::Pearson));
    }

    #[rstest]
    #[case::threshold("similarity_threshold", "high")]
    #[case::nan_threshold("similarity_threshold", "NaN")]
    #[case::zero_target("target_cluster_count", "0")]
    #[case::negative_target("target_cluster_count", "-2")]
    #[case::flag("keep_similarity_matrix_in_memory", "maybe")]
    #[case::linkage("linkage", "ward")]
    fn malformed_values_are_rejected(#[case] key: &str, #[case] value: &str) {
        let err = ClusteringOptions::parse([(key, value)]).expect_err("malformed value");
        assert!(
            matches!(err, OptionsError::InvalidValue { key: rejected, .. } if rejected == key),
            "unexpected error {err:?}"
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ClusteringOptions::parse([("cluster_threshold", "0.5")]).expect_err("unknown key");
        assert_eq!(
            err,
            OptionsError::UnknownKey {
                key: "cluster_threshold".into(),
            }
        );
        assert_eq!(err.code().as_str(), "OPTIONS_UNKNOWN_KEY");
    }

    #[test]
    fn both_stop_rules_conflict() {
        let err = ClusteringOptions::parse([
            ("similarity_threshold", "0.5"),
            ("target_cluster_count", "2"),
        ])
        .expect_err("conflicting stop rules");
        assert_eq!(err, OptionsError::ConflictingStopRules);
    }
}
