//! Merge history produced by the agglomerative engine.

use crate::error::{ClusteringError, Result};

/// One agglomeration step.
///
/// Clusters `0..item_count` are the initial singletons. The `k`-th merge
/// publishes the union of `remaining` and `merged` under id
/// `item_count + k`; ids are never reused.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Merge {
    merged: usize,
    remaining: usize,
    parent: usize,
    similarity: f64,
}

impl Merge {
    pub(crate) const fn new(merged: usize, remaining: usize, parent: usize, similarity: f64) -> Self {
        Self {
            merged,
            remaining,
            parent,
            similarity,
        }
    }

    #[rustfmt::skip]
    /// Returns the cluster absorbed by this merge.
    #[must_use]
    pub const fn merged(&self) -> usize { self.merged }

    #[rustfmt::skip]
    /// Returns the cluster whose pairing selected this merge.
    #[must_use]
    pub const fn remaining(&self) -> usize { self.remaining }

    #[rustfmt::skip]
    /// Returns the id under which the union is published.
    #[must_use]
    pub const fn parent(&self) -> usize { self.parent }

    #[rustfmt::skip]
    /// Returns the linkage similarity at which the merge happened.
    #[must_use]
    pub const fn similarity(&self) -> f64 { self.similarity }
}

/// Ordered merge history over `item_count` items.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dendrogram {
    item_count: usize,
    merges: Vec<Merge>,
}

impl Dendrogram {
    pub(crate) fn new(item_count: usize, merges: Vec<Merge>) -> Self {
        Self { item_count, merges }
    }

    /// Returns the number of clustered items.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Returns the number of merges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.merges.len()
    }

    /// Returns whether no merge happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.merges.is_empty()
    }

    /// Returns the merges in the order they were performed.
    #[must_use]
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Returns the number of clusters left after applying `prefix` merges.
    #[must_use]
    pub fn cluster_count_at(&self, prefix: usize) -> usize {
        self.item_count - prefix.min(self.merges.len())
    }

    /// Returns the grouping obtained by applying the first `prefix` merges.
    ///
    /// # Errors
    /// Returns [`ClusteringError::SolutionOutOfRange`] when `prefix` exceeds
    /// the number of merges.
    ///
    /// # Examples
    /// ```
    /// use plexus_core::{DenseSimilarityMatrix, StopRule, Linkage, build_dendrogram};
    ///
    /// let matrix = DenseSimilarityMatrix::from_fn(3, |i, j| if i + j == 1 { 0.9 } else { 0.1 });
    /// let dendrogram = build_dendrogram(&matrix, Linkage::Single, StopRule::Exhaustive)?;
    /// let grouping = dendrogram.replay(1)?;
    /// assert_eq!(grouping.clusters(), &[vec![0, 1], vec![2]]);
    /// # Ok::<(), plexus_core::ClusteringError>(())
    /// ```
    pub fn replay(&self, prefix: usize) -> Result<Grouping> {
        self.check_prefix(prefix)?;
        let mut arena = ReplayArena::new(self.item_count);
        for merge in &self.merges[..prefix] {
            arena.apply(merge);
        }
        Ok(arena.into_grouping())
    }

    /// Returns a contiguous label per item after `prefix` merges.
    ///
    /// Labels are ordered by the smallest member of each cluster.
    ///
    /// # Errors
    /// Returns [`ClusteringError::SolutionOutOfRange`] when `prefix` exceeds
    /// the number of merges.
    pub fn labels_at(&self, prefix: usize) -> Result<Vec<usize>> {
        let grouping = self.replay(prefix)?;
        let mut labels = vec![0; self.item_count];
        for (label, members) in grouping.clusters().iter().enumerate() {
            for &item in members {
                labels[item] = label;
            }
        }
        Ok(labels)
    }

    fn check_prefix(&self, prefix: usize) -> Result<()> {
        if prefix > self.merges.len() {
            Err(ClusteringError::SolutionOutOfRange {
                index: prefix,
                solutions: self.merges.len() + 1,
            })
        } else {
            Ok(())
        }
    }
}

/// Clusters active after a dendrogram prefix.
///
/// Each cluster lists its members ascending; clusters are ordered by their
/// smallest member.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Grouping {
    clusters: Vec<Vec<usize>>,
}

impl Grouping {
    /// Returns the clusters.
    #[must_use]
    pub fn clusters(&self) -> &[Vec<usize>] {
        &self.clusters
    }

    /// Returns the number of clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Returns whether there are no clusters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Consumes the grouping and returns its clusters.
    #[must_use]
    pub fn into_clusters(self) -> Vec<Vec<usize>> {
        self.clusters
    }
}

/// Cluster arena rebuilt by applying merges in order.
#[derive(Clone, Debug)]
pub(crate) struct ReplayArena {
    slots: Vec<Option<Vec<usize>>>,
}

impl ReplayArena {
    pub(crate) fn new(item_count: usize) -> Self {
        Self {
            slots: (0..item_count).map(|item| Some(vec![item])).collect(),
        }
    }

    /// Applies `merge` and returns the members of the published cluster.
    pub(crate) fn apply(&mut self, merge: &Merge) -> &[usize] {
        let left = self.take(merge.remaining);
        let right = self.take(merge.merged);
        let parent = merge.parent;
        if self.slots.len() <= parent {
            self.slots.resize(parent + 1, None);
        }
        self.slots[parent] = Some(merge_sorted(&left, &right));
        self.slots[parent].as_deref().unwrap_or_default()
    }

    /// Iterates over the active clusters and their members by id.
    pub(crate) fn active(&self) -> impl Iterator<Item = (usize, &[usize])> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(cluster, slot)| slot.as_deref().map(|members| (cluster, members)))
    }

    fn take(&mut self, cluster: usize) -> Vec<usize> {
        self.slots
            .get_mut(cluster)
            .and_then(Option::take)
            .unwrap_or_default()
    }

    pub(crate) fn into_grouping(self) -> Grouping {
        let mut clusters: Vec<Vec<usize>> = self.slots.into_iter().flatten().collect();
        clusters.sort_unstable_by_key(|members| members.first().copied());
        Grouping { clusters }
    }
}

/// Merges two ascending member lists.
pub(crate) fn merge_sorted(left: &[usize], right: &[usize]) -> Vec<usize> {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if left[i] <= right[j] {
            merged.push(left[i]);
            i += 1;
        } else {
            merged.push(right[j]);
            j += 1;
        }
    }
    merged.extend_from_slice(&left[i..]);
    merged.extend_from_slice(&right[j..]);
    merged
}
