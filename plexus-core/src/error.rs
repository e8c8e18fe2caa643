//! Error types for the Plexus core library.
//!
//! Every public error enum carries a stable machine-readable code so callers
//! can branch on failures without matching display strings.

use std::{fmt, sync::Arc};

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? $( ( $($tuple:tt)* ) )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? $( ( $($tuple)* ) )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced while reading a [`crate::Matrix`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MatrixError {
    /// A cell outside the matrix bounds was requested or supplied.
    #[error("cell ({row}, {column}) is outside a {rows}x{columns} matrix")]
    OutOfBounds {
        /// Requested row.
        row: usize,
        /// Requested column.
        column: usize,
        /// Number of rows in the matrix.
        rows: usize,
        /// Number of columns in the matrix.
        columns: usize,
    },
    /// The operation requires a square matrix.
    #[error("matrix must be square but has {rows} rows and {columns} columns")]
    NotSquare {
        /// Number of rows in the matrix.
        rows: usize,
        /// Number of columns in the matrix.
        columns: usize,
    },
    /// The operation requires a sparse adjacency-style matrix.
    #[error("matrix must use a sparse layout")]
    NotSparse,
    /// A stored value was NaN or infinite.
    #[error("cell ({row}, {column}) holds a non-finite value")]
    NonFinite {
        /// Row of the offending value.
        row: usize,
        /// Column of the offending value.
        column: usize,
    },
    /// Dense rows supplied to a constructor had different lengths.
    #[error("row {row} has {found} columns but {expected} were expected")]
    RaggedRow {
        /// Index of the offending row.
        row: usize,
        /// Number of values found in that row.
        found: usize,
        /// Number of values in the first row.
        expected: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`MatrixError`] variants.
    enum MatrixErrorCode for MatrixError {
        /// A cell outside the matrix bounds was requested or supplied.
        OutOfBounds => OutOfBounds { .. } => "MATRIX_OUT_OF_BOUNDS",
        /// The operation requires a square matrix.
        NotSquare => NotSquare { .. } => "MATRIX_NOT_SQUARE",
        /// The operation requires a sparse adjacency-style matrix.
        NotSparse => NotSparse => "MATRIX_NOT_SPARSE",
        /// A stored value was NaN or infinite.
        NonFinite => NonFinite { .. } => "MATRIX_NON_FINITE",
        /// Dense rows had different lengths.
        RaggedRow => RaggedRow { .. } => "MATRIX_RAGGED_ROW",
    }
}

/// An error produced while parsing [`crate::ClusteringOptions`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum OptionsError {
    /// The option key is not recognised.
    #[error("unknown clustering option `{key}`")]
    UnknownKey {
        /// Key supplied by the caller.
        key: Arc<str>,
    },
    /// The option value could not be parsed.
    #[error("invalid value `{value}` for clustering option `{key}`")]
    InvalidValue {
        /// Key whose value was rejected.
        key: &'static str,
        /// Raw value supplied by the caller.
        value: Arc<str>,
    },
    /// Both a similarity threshold and a target cluster count were supplied.
    #[error("similarity_threshold and target_cluster_count are mutually exclusive")]
    ConflictingStopRules,
}

define_error_codes! {
    /// Stable codes describing [`OptionsError`] variants.
    enum OptionsErrorCode for OptionsError {
        /// The option key is not recognised.
        UnknownKey => UnknownKey { .. } => "OPTIONS_UNKNOWN_KEY",
        /// The option value could not be parsed.
        InvalidValue => InvalidValue { .. } => "OPTIONS_INVALID_VALUE",
        /// Both stop rules were supplied.
        ConflictingStopRules => ConflictingStopRules => "OPTIONS_CONFLICTING_STOP_RULES",
    }
}

/// Names the fork-join region in which a parallel task ran.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ParallelRegion {
    /// Pairwise similarity matrix construction.
    SimilarityFill,
    /// Partition-density evaluation over the merge history.
    DensitySweep,
}

impl ParallelRegion {
    /// Returns a short identifier suitable for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SimilarityFill => "similarity_fill",
            Self::DensitySweep => "density_sweep",
        }
    }
}

impl fmt::Display for ParallelRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure reported by one task of a parallel region.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskFailure {
    /// Index of the failed task (row for similarity fills, chunk for sweeps).
    pub task: usize,
    /// Error returned by the task.
    pub error: ClusteringError,
}

/// Error type produced when configuring or running a clustering.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ClusteringError {
    /// Neither a similarity threshold nor a target cluster count was given.
    #[error("either a similarity threshold or a target cluster count must be configured")]
    MissingStopRule,
    /// The similarity threshold was NaN.
    #[error("similarity threshold must be a number (got {threshold})")]
    InvalidThreshold {
        /// Threshold supplied by the caller.
        threshold: f64,
    },
    /// The target cluster count was zero or exceeded the number of items.
    #[error("target cluster count {target} is invalid for {items} items")]
    InvalidTargetClusterCount {
        /// Requested number of clusters.
        target: usize,
        /// Number of items available.
        items: usize,
    },
    /// The input contained no items.
    #[error("cannot cluster an empty input")]
    EmptyInput,
    /// A similarity matrix did not have the expected number of values.
    #[error("similarity values have length {len} but {expected} were expected")]
    SimilarityShape {
        /// Number of values supplied.
        len: usize,
        /// Number of values required.
        expected: usize,
    },
    /// A similarity value was NaN or infinite.
    #[error("similarity between {left} and {right} is not finite")]
    NonFiniteSimilarity {
        /// First item of the offending pair.
        left: usize,
        /// Second item of the offending pair.
        right: usize,
    },
    /// A solution index outside the merge history was requested.
    #[error("solution {index} is out of range; {solutions} solutions are available")]
    SolutionOutOfRange {
        /// Requested solution index.
        index: usize,
        /// Number of available solutions.
        solutions: usize,
    },
    /// A solution was requested before any clustering run completed.
    #[error("no clustering run has completed yet")]
    NoCompletedRun,
    /// A k-partite graph was configured with zero partitions.
    #[error("partition count must be at least 1")]
    ZeroPartitions,
    /// The node-to-partition mapping does not cover the graph.
    #[error("partition mapping covers {mapped} nodes but the graph has {nodes}")]
    PartitionMappingLength {
        /// Number of nodes covered by the mapping.
        mapped: usize,
        /// Number of nodes in the graph.
        nodes: usize,
    },
    /// A node was mapped to a partition that does not exist.
    #[error("node {node} maps to partition {partition} but only {partition_count} exist")]
    InvalidPartition {
        /// Offending node.
        node: usize,
        /// Partition the node was mapped to.
        partition: usize,
        /// Number of configured partitions.
        partition_count: usize,
    },
    /// The run was cancelled cooperatively.
    #[error("clustering was cancelled during {region}")]
    Cancelled {
        /// Region that observed the cancellation.
        region: ParallelRegion,
    },
    /// One or more tasks of a parallel region failed.
    #[error("{} task(s) failed during {region}", .failures.len())]
    TaskFailures {
        /// Region in which the tasks ran.
        region: ParallelRegion,
        /// Every failure observed, ordered by task index.
        failures: Vec<TaskFailure>,
    },
    /// A synchronisation primitive became poisoned after a panic.
    #[error("lock for {resource} is poisoned")]
    LockPoisoned {
        /// Name of the poisoned resource.
        resource: &'static str,
    },
    /// The dedicated worker pool could not be created.
    #[error("failed to build worker pool: {message}")]
    WorkerPool {
        /// Message reported by the pool builder.
        message: Arc<str>,
    },
    /// The input matrix was rejected.
    #[error(transparent)]
    Matrix(#[from] MatrixError),
    /// Clustering options were rejected.
    #[error(transparent)]
    Options(#[from] OptionsError),
}

define_error_codes! {
    /// Stable codes describing [`ClusteringError`] variants.
    enum ClusteringErrorCode for ClusteringError {
        /// No stop rule was configured.
        MissingStopRule => MissingStopRule => "CLUSTERING_MISSING_STOP_RULE",
        /// The similarity threshold was NaN.
        InvalidThreshold => InvalidThreshold { .. } => "CLUSTERING_INVALID_THRESHOLD",
        /// The target cluster count was invalid.
        InvalidTargetClusterCount => InvalidTargetClusterCount { .. } => "CLUSTERING_INVALID_TARGET_COUNT",
        /// The input contained no items.
        EmptyInput => EmptyInput => "CLUSTERING_EMPTY_INPUT",
        /// A similarity matrix had the wrong size.
        SimilarityShape => SimilarityShape { .. } => "CLUSTERING_SIMILARITY_SHAPE",
        /// A similarity value was not finite.
        NonFiniteSimilarity => NonFiniteSimilarity { .. } => "CLUSTERING_NON_FINITE_SIMILARITY",
        /// A solution index was out of range.
        SolutionOutOfRange => SolutionOutOfRange { .. } => "CLUSTERING_SOLUTION_OUT_OF_RANGE",
        /// No run has completed.
        NoCompletedRun => NoCompletedRun => "CLUSTERING_NO_COMPLETED_RUN",
        /// Zero partitions were configured.
        ZeroPartitions => ZeroPartitions => "CLUSTERING_ZERO_PARTITIONS",
        /// The partition mapping has the wrong length.
        PartitionMappingLength => PartitionMappingLength { .. } => "CLUSTERING_PARTITION_MAPPING_LENGTH",
        /// A node maps to an unknown partition.
        InvalidPartition => InvalidPartition { .. } => "CLUSTERING_INVALID_PARTITION",
        /// The run was cancelled.
        Cancelled => Cancelled { .. } => "CLUSTERING_CANCELLED",
        /// Parallel tasks failed.
        TaskFailures => TaskFailures { .. } => "CLUSTERING_TASK_FAILURES",
        /// A lock was poisoned.
        LockPoisoned => LockPoisoned { .. } => "CLUSTERING_LOCK_POISONED",
        /// The worker pool could not be built.
        WorkerPool => WorkerPool { .. } => "CLUSTERING_WORKER_POOL",
        /// The input matrix was rejected.
        MatrixFailure => Matrix(..) => "CLUSTERING_MATRIX_FAILURE",
        /// Clustering options were rejected.
        OptionsFailure => Options(..) => "CLUSTERING_OPTIONS_FAILURE",
    }
}

impl ClusteringError {
    /// Retrieve the inner [`MatrixErrorCode`] when the error originated in a matrix.
    #[must_use]
    pub const fn matrix_code(&self) -> Option<MatrixErrorCode> {
        match self {
            Self::Matrix(error) => Some(error.code()),
            _ => None,
        }
    }

    /// Returns `true` for errors caused by arguments the caller supplied.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::MissingStopRule
                | Self::InvalidThreshold { .. }
                | Self::InvalidTargetClusterCount { .. }
                | Self::EmptyInput
                | Self::SimilarityShape { .. }
                | Self::SolutionOutOfRange { .. }
                | Self::ZeroPartitions
                | Self::PartitionMappingLength { .. }
                | Self::InvalidPartition { .. }
                | Self::Matrix(_)
                | Self::Options(_)
        )
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, ClusteringError>;
