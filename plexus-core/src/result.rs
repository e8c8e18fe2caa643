//! Result types shared by point and link clustering.
//!
//! Point clustering yields exactly one [`ClusterId`] per item; link clustering
//! yields a possibly empty set per node. Both can be expressed as
//! [`Assignment`]s.

use thiserror::Error;

/// Identifier assigned to a cluster.
///
/// # Examples
/// ```
/// use plexus_core::ClusterId;
///
/// let id = ClusterId::new(4);
/// assert_eq!(id.get(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(u64);

impl ClusterId {
    /// Creates a new cluster identifier.
    #[rustfmt::skip]
    #[must_use]
    pub const fn new(id: u64) -> Self { Self(id) }

    /// Returns the underlying numeric identifier.
    #[rustfmt::skip]
    #[must_use]
    pub const fn get(self) -> u64 { self.0 }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u64)
    }
}

/// Error returned when hard labels do not number clusters `0..k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NonContiguousClusterIds {
    /// No item carries cluster `0`.
    #[error("cluster identifiers must include 0")]
    MissingZero,
    /// An identifier below the maximum is never used.
    #[error("cluster identifier {missing} is skipped")]
    Gap {
        /// Smallest unused identifier.
        missing: u64,
    },
}

/// Hard clustering of items with contiguous cluster ids.
///
/// # Examples
/// ```
/// use plexus_core::{ClusterId, ClusteringResult};
///
/// let result = ClusteringResult::try_from_labels(vec![ClusterId::new(1), ClusterId::new(0)])?;
/// assert_eq!(result.cluster_count(), 2);
/// assert_eq!(result.assignments()[0].get(), 1);
/// # Ok::<(), plexus_core::NonContiguousClusterIds>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusteringResult {
    labels: Vec<ClusterId>,
    cluster_count: usize,
}

impl ClusteringResult {
    /// Validates that `labels` use every id in `0..=max` and wraps them.
    ///
    /// An empty label list yields zero clusters.
    ///
    /// # Errors
    /// Returns [`NonContiguousClusterIds::MissingZero`] when no item is in
    /// cluster `0` and [`NonContiguousClusterIds::Gap`] when an id below the
    /// maximum is unused.
    pub fn try_from_labels(labels: Vec<ClusterId>) -> Result<Self, NonContiguousClusterIds> {
        let Some(max) = labels.iter().map(|id| id.get()).max() else {
            return Ok(Self {
                labels,
                cluster_count: 0,
            });
        };
        let mut used: Vec<u64> = labels.iter().map(|id| id.get()).collect();
        used.sort_unstable();
        used.dedup();
        if used.first() != Some(&0) {
            return Err(NonContiguousClusterIds::MissingZero);
        }
        if let Some(missing) = (0..=max).zip(&used).find(|(expected, id)| expected != *id) {
            return Err(NonContiguousClusterIds::Gap { missing: missing.0 });
        }
        Ok(Self {
            cluster_count: used.len(),
            labels,
        })
    }

    /// Builds a result from labels already known to be contiguous.
    pub(crate) fn from_contiguous(labels: Vec<usize>, cluster_count: usize) -> Self {
        Self {
            labels: labels.into_iter().map(ClusterId::from_index).collect(),
            cluster_count,
        }
    }

    /// Returns one cluster id per item, in item order.
    #[must_use]
    pub fn assignments(&self) -> &[ClusterId] {
        &self.labels
    }

    /// Returns how many distinct clusters exist.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }

    /// Lists the members of each cluster, indexed by cluster id.
    #[must_use]
    pub fn clusters(&self) -> Vec<Vec<usize>> {
        let mut clusters = vec![Vec::new(); self.cluster_count];
        for (item, id) in self.labels.iter().enumerate() {
            if let Some(members) = usize::try_from(id.get())
                .ok()
                .and_then(|index| clusters.get_mut(index))
            {
                members.push(item);
            }
        }
        clusters
    }

    /// Converts the hard labels into single-element soft assignments.
    #[must_use]
    pub fn to_assignments(&self) -> Vec<Assignment> {
        self.labels
            .iter()
            .map(|&id| Assignment { clusters: vec![id] })
            .collect()
    }
}

/// Set of clusters an item or node belongs to, ascending and duplicate free.
///
/// Link clustering may place a node in several clusters, or in none when it
/// has no incident edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Assignment {
    clusters: Vec<ClusterId>,
}

impl Assignment {
    /// Creates an assignment from arbitrary ids, sorting and de-duplicating.
    ///
    /// # Examples
    /// ```
    /// use plexus_core::{Assignment, ClusterId};
    ///
    /// let assignment = Assignment::from_ids([ClusterId::new(3), ClusterId::new(1), ClusterId::new(3)]);
    /// assert_eq!(assignment.ids(), &[ClusterId::new(1), ClusterId::new(3)]);
    /// ```
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = ClusterId>) -> Self {
        let mut clusters: Vec<ClusterId> = ids.into_iter().collect();
        clusters.sort_unstable();
        clusters.dedup();
        Self { clusters }
    }

    pub(crate) fn insert(&mut self, id: ClusterId) {
        if let Err(position) = self.clusters.binary_search(&id) {
            self.clusters.insert(position, id);
        }
    }

    /// Returns the cluster ids, ascending.
    #[must_use]
    pub fn ids(&self) -> &[ClusterId] {
        &self.clusters
    }

    /// Returns how many clusters the item belongs to.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Returns whether the item belongs to no cluster.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Returns whether the item belongs to `id`.
    #[must_use]
    pub fn contains(&self, id: ClusterId) -> bool {
        self.clusters.binary_search(&id).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn ids(values: &[u64]) -> Vec<ClusterId> {
        values.iter().copied().map(ClusterId::new).collect()
    }

    #[rstest]
    #[case::empty(&[], 0)]
    #[case::single(&[0, 0, 0], 1)]
    #[case::shuffled(&[2, 0, 1, 2], 3)]
    fn contiguous_labels_are_accepted(#[case] labels: &[u64], #[case] clusters: usize) {
        let result = ClusteringResult::try_from_labels(ids(labels)).expect("contiguous labels");
        assert_eq!(result.cluster_count(), clusters);
        assert_eq!(result.assignments().len(), labels.len());
    }

    #[rstest]
    #[case::missing_zero(&[1, 2], NonContiguousClusterIds::MissingZero)]
    #[case::gap(&[0, 3, 1], NonContiguousClusterIds::Gap { missing: 2 })]
    fn non_contiguous_labels_are_rejected(
        #[case] labels: &[u64],
        #[case] expected: NonContiguousClusterIds,
    ) {
        let err = ClusteringResult::try_from_labels(ids(labels)).expect_err("invalid labels");
        assert_eq!(err, expected);
    }

    #[test]
    fn clusters_group_items_by_label() {
        let result = ClusteringResult::from_contiguous(vec![1, 0, 1], 2);
        assert_eq!(result.clusters(), vec![vec![1], vec![0, 2]]);
        let soft = result.to_assignments();
        assert!(soft.iter().all(|assignment| assignment.len() == 1));
        assert!(soft[2].contains(ClusterId::new(1)));
    }

    #[test]
    fn insert_keeps_ids_sorted_and_unique() {
        let mut assignment = Assignment::default();
        for id in [4, 1, 4, 2] {
            assignment.insert(ClusterId::new(id));
        }
        assert_eq!(assignment.ids(), ids(&[1, 2, 4]).as_slice());
    }
}
