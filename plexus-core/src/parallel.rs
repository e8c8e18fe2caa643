//! Structured fork-join helpers for the parallel regions.
//!
//! Both parallel regions (similarity fill and density sweep) run bounded
//! rayon tasks over a partitioned index space, join every task, and only then
//! report failures. Cancellation is cooperative and observed at task
//! granularity.

use std::{
    num::NonZeroUsize,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use rayon::prelude::*;

use crate::{
    error::{ClusteringError, ParallelRegion, Result, TaskFailure},
    logging::RunLog,
};

/// Cooperative cancellation flag shared between a caller and a running job.
///
/// # Examples
/// ```
/// use plexus_core::Cancellation;
///
/// let cancel = Cancellation::new();
/// let handle = cancel.clone();
/// handle.cancel();
/// assert!(cancel.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    /// Creates a flag that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Running tasks stop at their next check.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Selects how many workers the parallel regions use.
///
/// Results never depend on this setting; only wall-clock time does.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Parallelism {
    /// Use the ambient rayon pool.
    #[default]
    Auto,
    /// Use a dedicated pool with exactly this many threads.
    Threads(NonZeroUsize),
}

/// Rayon pool backing the parallel regions.
#[derive(Clone, Debug, Default)]
enum Pool {
    #[default]
    Ambient,
    Dedicated(Arc<rayon::ThreadPool>),
    /// Building the pool failed; reported when a region first needs it.
    Unavailable(Arc<str>),
}

impl Pool {
    fn for_parallelism(parallelism: Parallelism) -> Self {
        match parallelism {
            Parallelism::Auto => Self::Ambient,
            Parallelism::Threads(threads) => match rayon::ThreadPoolBuilder::new()
                .num_threads(threads.get())
                .thread_name(|index| format!("plexus-worker-{index}"))
                .build()
            {
                Ok(pool) => Self::Dedicated(Arc::new(pool)),
                Err(error) => Self::Unavailable(Arc::from(error.to_string())),
            },
        }
    }
}

/// Execution context shared by the parallel regions of one run.
///
/// The dedicated pool, if any, is built once here and shared by clones.
#[derive(Clone, Debug, Default)]
pub(crate) struct Workers {
    parallelism: Parallelism,
    pool: Pool,
    cancellation: Cancellation,
    log: RunLog,
}

impl Workers {
    pub(crate) fn new(parallelism: Parallelism, cancellation: Cancellation, log: RunLog) -> Self {
        Self {
            parallelism,
            pool: Pool::for_parallelism(parallelism),
            cancellation,
            log,
        }
    }

    pub(crate) fn log(&self) -> &RunLog {
        &self.log
    }

    /// Returns the number of workers the regions will be split across.
    pub(crate) fn thread_count(&self) -> usize {
        match self.parallelism {
            Parallelism::Auto => rayon::current_num_threads().max(1),
            Parallelism::Threads(threads) => threads.get(),
        }
    }

    /// Fails with [`ClusteringError::Cancelled`] once cancellation was requested.
    pub(crate) fn check_cancelled(&self, region: ParallelRegion) -> Result<()> {
        if self.cancellation.is_cancelled() {
            Err(ClusteringError::Cancelled { region })
        } else {
            Ok(())
        }
    }

    /// Runs `operation` inside the configured pool.
    pub(crate) fn install<R: Send>(&self, operation: impl FnOnce() -> R + Send) -> Result<R> {
        match &self.pool {
            Pool::Ambient => Ok(operation()),
            Pool::Dedicated(pool) => Ok(pool.install(operation)),
            Pool::Unavailable(message) => Err(ClusteringError::WorkerPool {
                message: Arc::clone(message),
            }),
        }
    }

    /// Runs one task per index in `0..tasks`, joins them all, then combines.
    ///
    /// Each task sees the run's log scope. Every failure is collected; the
    /// region fails with [`ClusteringError::TaskFailures`] listing all of them,
    /// or with [`ClusteringError::Cancelled`] when cancellation was requested.
    pub(crate) fn fork_join<T, F>(
        &self,
        region: ParallelRegion,
        tasks: usize,
        task: F,
    ) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize) -> Result<T> + Sync,
    {
        let outcomes: Vec<Result<T>> = self.install(|| {
            (0..tasks)
                .into_par_iter()
                .map(|index| {
                    self.check_cancelled(region)?;
                    self.log.in_scope(|| task(index))
                })
                .collect()
        })?;
        self.settle(region, outcomes)
    }

    /// Converts joined task outcomes into a single result.
    pub(crate) fn settle<T>(&self, region: ParallelRegion, outcomes: Vec<Result<T>>) -> Result<Vec<T>> {
        self.check_cancelled(region)?;
        let mut values = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (task, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(value) => values.push(value),
                Err(error) => failures.push(TaskFailure { task, error }),
            }
        }
        if failures.is_empty() {
            Ok(values)
        } else {
            tracing::warn!(
                region = %region,
                failed = failures.len(),
                "parallel tasks failed"
            );
            Err(ClusteringError::TaskFailures { region, failures })
        }
    }
}
