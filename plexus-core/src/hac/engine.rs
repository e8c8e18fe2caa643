//! Sequential merge loop with cached best partners.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use crate::{
    error::{ClusteringError, Result},
    similarity::SimilarityMatrix,
};

use super::{Dendrogram, Linkage, Merge, StopRule, merge_sorted};

/// Most similar active partner of a cluster.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Pairing {
    partner: usize,
    similarity: f64,
}

impl Pairing {
    /// Keeps the first candidate on ties so ascending scans favour low ids.
    fn offer(best: &mut Option<Self>, partner: usize, similarity: f64) {
        if best.is_none_or(|current| similarity > current.similarity) {
            *best = Some(Self {
                partner,
                similarity,
            });
        }
    }
}

pub(super) struct Engine<'a, S: ?Sized> {
    matrix: &'a S,
    linkage: Linkage,
    item_count: usize,
    members: Vec<Option<Vec<usize>>>,
    /// Cache slot of every cluster id; a parent inherits its remaining child's.
    slots: Vec<usize>,
    links: LinkCache,
    active: BTreeSet<usize>,
    pairings: BTreeMap<usize, Pairing>,
    merges: Vec<Merge>,
}

impl<'a, S: SimilarityMatrix + ?Sized> Engine<'a, S> {
    /// Reads every item pair once, then pairs each singleton with one scan.
    pub(super) fn seed(matrix: &'a S, linkage: Linkage) -> Result<Self> {
        let item_count = matrix.len();
        let mut engine = Self {
            matrix,
            linkage,
            item_count,
            members: (0..item_count).map(|item| Some(vec![item])).collect(),
            slots: (0..item_count).collect(),
            links: LinkCache::read(matrix)?,
            active: (0..item_count).collect(),
            pairings: BTreeMap::new(),
            merges: Vec::with_capacity(item_count.saturating_sub(1)),
        };
        for cluster in 0..item_count {
            if let Some(pairing) = engine.scan(cluster) {
                engine.pairings.insert(cluster, pairing);
            }
        }
        Ok(engine)
    }

    pub(super) fn run(mut self, stop: StopRule) -> Result<Dendrogram> {
        while self.active.len() > 1 {
            if let StopRule::TargetClusters(target) = stop
                && self.active.len() <= target
            {
                break;
            }
            let Some((remaining, best)) = self.best_pair() else {
                break;
            };
            if let StopRule::Threshold(threshold) = stop
                && best.similarity < threshold
            {
                debug!(
                    similarity = best.similarity,
                    threshold, "best similarity below threshold"
                );
                break;
            }
            self.merge(remaining, best)?;
        }
        record_merges(self.merges.len());
        debug!(
            merges = self.merges.len(),
            clusters = self.active.len(),
            "agglomeration finished"
        );
        Ok(Dendrogram::new(self.item_count, self.merges))
    }

    /// Returns the active cluster with the highest cached similarity.
    fn best_pair(&self) -> Option<(usize, Pairing)> {
        let mut best: Option<(usize, Pairing)> = None;
        for (&cluster, &pairing) in &self.pairings {
            if best.is_none_or(|(_, current)| pairing.similarity > current.similarity) {
                best = Some((cluster, pairing));
            }
        }
        best
    }

    fn merge(&mut self, remaining: usize, best: Pairing) -> Result<()> {
        let merged = best.partner;
        let parent = self.item_count + self.merges.len();
        let remaining_size = self.size(remaining);
        let merged_size = self.size(merged);
        let left = self.retire(remaining);
        let right = self.retire(merged);
        self.members.push(Some(merge_sorted(&left, &right)));
        let parent_slot = self.slot(remaining);
        let merged_slot = self.slot(merged);
        self.slots.push(parent_slot);
        self.merges
            .push(Merge::new(merged, remaining, parent, best.similarity));
        trace!(
            merged,
            remaining,
            parent,
            similarity = best.similarity,
            "clusters merged"
        );

        let mut parent_pairing = None;
        let others: Vec<usize> = self.active.iter().copied().collect();
        for other in others {
            let other_slot = self.slot(other);
            let towards_parent = match self.linkage {
                Linkage::Median => self.median_between(other, parent)?,
                linkage => linkage.fold(
                    (self.links.get(parent_slot, other_slot), remaining_size),
                    (self.links.get(merged_slot, other_slot), merged_size),
                ),
            };
            self.links.set(parent_slot, other_slot, towards_parent);
            Pairing::offer(&mut parent_pairing, other, towards_parent);

            let cached = self.pairings.get(&other).copied();
            let repaired = match cached {
                Some(pairing) if pairing.partner != remaining && pairing.partner != merged => {
                    if towards_parent > pairing.similarity {
                        Pairing {
                            partner: parent,
                            similarity: towards_parent,
                        }
                    } else {
                        pairing
                    }
                }
                // The partner was consumed; the parent is not active yet, so
                // the rescan only sees the survivors.
                _ => {
                    let mut rescanned = self.scan(other);
                    Pairing::offer(&mut rescanned, parent, towards_parent);
                    rescanned.unwrap_or(Pairing {
                        partner: parent,
                        similarity: towards_parent,
                    })
                }
            };
            self.pairings.insert(other, repaired);
        }

        self.active.insert(parent);
        if let Some(pairing) = parent_pairing {
            self.pairings.insert(parent, pairing);
        }
        Ok(())
    }

    fn retire(&mut self, cluster: usize) -> Vec<usize> {
        self.active.remove(&cluster);
        self.pairings.remove(&cluster);
        self.members
            .get_mut(cluster)
            .and_then(Option::take)
            .unwrap_or_default()
    }

    /// Finds the best partner of `cluster` among the other active clusters.
    fn scan(&self, cluster: usize) -> Option<Pairing> {
        let slot = self.slot(cluster);
        let mut best = None;
        for &other in &self.active {
            if other != cluster {
                Pairing::offer(&mut best, other, self.links.get(slot, self.slot(other)));
            }
        }
        best
    }

    /// Recomputes the median linkage from the members of both clusters.
    fn median_between(&self, left: usize, right: usize) -> Result<f64> {
        let left_members = self.members(left);
        let right_members = self.members(right);
        let mut values = Vec::with_capacity(left_members.len() * right_members.len());
        for &i in left_members {
            for &j in right_members {
                let value = self.matrix.similarity(i, j);
                if !value.is_finite() {
                    return Err(ClusteringError::NonFiniteSimilarity { left: i, right: j });
                }
                values.push(value);
            }
        }
        Ok(median(&mut values))
    }

    fn members(&self, cluster: usize) -> &[usize] {
        self.members
            .get(cluster)
            .and_then(Option::as_deref)
            .unwrap_or_default()
    }

    fn size(&self, cluster: usize) -> usize {
        self.members(cluster).len()
    }

    fn slot(&self, cluster: usize) -> usize {
        self.slots.get(cluster).copied().unwrap_or(cluster)
    }
}

impl Linkage {
    /// Combines the linkages of two clusters towards a third into the linkage
    /// of their union towards it. Each side carries its cluster size.
    ///
    /// Median does not decompose; the engine recomputes it from members.
    fn fold(self, (left, left_size): (f64, usize), (right, right_size): (f64, usize)) -> f64 {
        match self {
            Self::Single => left.max(right),
            Self::Complete => left.min(right),
            Self::Mean | Self::Median => {
                let total = (left_size + right_size) as f64;
                if total == 0.0 {
                    0.0
                } else {
                    (left * left_size as f64 + right * right_size as f64) / total
                }
            }
        }
    }
}

/// Upper triangle of linkage values between cache slots.
struct LinkCache {
    len: usize,
    upper: Vec<f64>,
}

impl LinkCache {
    fn read<S: SimilarityMatrix + ?Sized>(matrix: &S) -> Result<Self> {
        let len = matrix.len();
        let mut upper = Vec::with_capacity(len * len.saturating_sub(1) / 2);
        for left in 0..len {
            for right in left + 1..len {
                let value = matrix.similarity(left, right);
                if !value.is_finite() {
                    return Err(ClusteringError::NonFiniteSimilarity { left, right });
                }
                upper.push(value);
            }
        }
        Ok(Self { len, upper })
    }

    fn offset(&self, left: usize, right: usize) -> usize {
        let (low, high) = if left < right {
            (left, right)
        } else {
            (right, left)
        };
        low * self.len - low * (low + 1) / 2 + (high - low - 1)
    }

    fn get(&self, left: usize, right: usize) -> f64 {
        if left == right {
            return 0.0;
        }
        self.upper
            .get(self.offset(left, right))
            .copied()
            .unwrap_or_default()
    }

    fn set(&mut self, left: usize, right: usize, value: f64) {
        if left != right {
            let offset = self.offset(left, right);
            if let Some(cell) = self.upper.get_mut(offset) {
                *cell = value;
            }
        }
    }
}

/// Element `count / 2` of the ascending values; `0` when there are none.
fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable_by(f64::total_cmp);
    values[values.len() / 2]
}

#[cfg(feature = "metrics")]
fn record_merges(count: usize) {
    metrics::counter!("plexus_hac_merges_total").increment(count as u64);
}

#[cfg(not(feature = "metrics"))]
fn record_merges(_count: usize) {}
