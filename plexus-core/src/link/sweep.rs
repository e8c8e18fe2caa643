//! Parallel partition-density sweep over a merge history.
//!
//! The prefixes `0..merges` are split into one contiguous chunk per worker.
//! Each chunk replays the history up to its first prefix once, then applies
//! its own merges one at a time, writing densities into its disjoint slice.

use std::{
    sync::Mutex,
    time::{Duration, Instant},
};

use rayon::prelude::*;
use tracing::{debug, instrument, trace};

use crate::{
    error::{ClusteringError, ParallelRegion, Result},
    graph::EdgeList,
    hac::{Dendrogram, Merge, ReplayArena},
    parallel::Workers,
};

use super::density::{DensityScorer, ScoreTree, scale};

/// Densities of every prefix and the densest one.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SweepOutcome {
    pub(crate) densities: Vec<f64>,
    pub(crate) best_prefix: usize,
    pub(crate) best_density: f64,
}

/// Guarded running maximum shared by the chunks. Ties go to the lower prefix.
#[derive(Debug, Default)]
struct BestDensity(Mutex<Option<(usize, f64)>>);

impl BestDensity {
    fn offer(&self, prefix: usize, density: f64) -> Result<()> {
        let mut best = self.0.lock().map_err(|_| ClusteringError::LockPoisoned {
            resource: "best_density",
        })?;
        let replace = best.is_none_or(|(current_prefix, current)| {
            density > current || (density == current && prefix < current_prefix)
        });
        if replace {
            *best = Some((prefix, density));
        }
        Ok(())
    }

    fn into_inner(self) -> Result<Option<(usize, f64)>> {
        self.0.into_inner().map_err(|_| ClusteringError::LockPoisoned {
            resource: "best_density",
        })
    }
}

/// Replay state private to one chunk.
struct ChunkState<'a, D: ?Sized> {
    edges: &'a EdgeList,
    scorer: &'a D,
    arena: ReplayArena,
    scores: ScoreTree,
}

impl<'a, D: DensityScorer + ?Sized> ChunkState<'a, D> {
    /// Applies `merges` and scores every resulting cluster.
    fn replayed(edges: &'a EdgeList, merges: &[Merge], scorer: &'a D) -> Result<Self> {
        let mut arena = ReplayArena::new(edges.len());
        for merge in merges {
            arena.apply(merge);
        }
        // Merge ids stay below `2E - 1`.
        let mut scores = ScoreTree::new(2 * edges.len());
        for (cluster, members) in arena.active() {
            scores.set(cluster, scorer.cluster_score(edges, members)?);
        }
        Ok(Self {
            edges,
            scorer,
            arena,
            scores,
        })
    }

    fn apply(&mut self, merge: &Merge) -> Result<()> {
        let members = self.arena.apply(merge);
        let score = self.scorer.cluster_score(self.edges, members)?;
        self.scores.set(merge.remaining(), 0.0);
        self.scores.set(merge.merged(), 0.0);
        self.scores.set(merge.parent(), score);
        Ok(())
    }

    fn density(&self) -> f64 {
        scale(self.edges.len(), self.scores.total())
    }
}

/// Scores every prefix `0..dendrogram.len()` and picks the densest.
///
/// A history without merges scores the singleton partition only.
#[instrument(
    name = "link.density_sweep",
    err,
    skip_all,
    fields(edges = edges.len(), merges = dendrogram.len(), workers = workers.thread_count()),
)]
pub(crate) fn density_sweep<D: DensityScorer + ?Sized>(
    edges: &EdgeList,
    dendrogram: &Dendrogram,
    scorer: &D,
    workers: &Workers,
) -> Result<SweepOutcome> {
    let started = Instant::now();
    let merges = dendrogram.merges();
    if merges.is_empty() {
        workers.check_cancelled(ParallelRegion::DensitySweep)?;
        let state = ChunkState::replayed(edges, &[], scorer)?;
        return Ok(SweepOutcome {
            densities: Vec::new(),
            best_prefix: 0,
            best_density: state.density(),
        });
    }

    let chunk_len = merges.len().div_ceil(workers.thread_count());
    let mut densities = vec![0.0; merges.len()];
    let best = BestDensity::default();
    let outcomes: Vec<Result<()>> = workers.install(|| {
        densities
            .par_chunks_mut(chunk_len)
            .enumerate()
            .map(|(chunk, slice)| {
                workers.check_cancelled(ParallelRegion::DensitySweep)?;
                workers.log().in_scope(|| {
                    sweep_chunk(edges, merges, scorer, workers, chunk * chunk_len, slice, &best)
                })
            })
            .collect()
    })?;
    workers.settle(ParallelRegion::DensitySweep, outcomes)?;

    let (best_prefix, best_density) = best.into_inner()?.unwrap_or((0, 0.0));
    record_sweep(started.elapsed());
    debug!(
        chunks = merges.len().div_ceil(chunk_len),
        best_prefix, best_density, "density sweep finished"
    );
    Ok(SweepOutcome {
        densities,
        best_prefix,
        best_density,
    })
}

fn sweep_chunk<D: DensityScorer + ?Sized>(
    edges: &EdgeList,
    merges: &[Merge],
    scorer: &D,
    workers: &Workers,
    start: usize,
    slice: &mut [f64],
    best: &BestDensity,
) -> Result<()> {
    let mut state = ChunkState::replayed(edges, &merges[..start], scorer)?;
    let mut local: Option<(usize, f64)> = None;
    for (offset, slot) in slice.iter_mut().enumerate() {
        let prefix = start + offset;
        if offset > 0 {
            workers.check_cancelled(ParallelRegion::DensitySweep)?;
            state.apply(&merges[prefix - 1])?;
        }
        let density = state.density();
        trace!(prefix, density, "partition density");
        *slot = density;
        if local.is_none_or(|(_, current)| density > current) {
            local = Some((prefix, density));
        }
    }
    match local {
        Some((prefix, density)) => best.offer(prefix, density),
        None => Ok(()),
    }
}

#[cfg(feature = "metrics")]
fn record_sweep(elapsed: Duration) {
    metrics::histogram!("plexus_density_sweep_seconds").record(elapsed.as_secs_f64());
}

#[cfg(not(feature = "metrics"))]
fn record_sweep(_elapsed: Duration) {}
