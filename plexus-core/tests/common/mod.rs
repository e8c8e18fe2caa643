use std::num::NonZeroUsize;

use plexus_core::{Assignment, ClusterId, Parallelism, SparseMatrix};
use plexus_test_support::graphs::Pairs;

/// Builds the symmetric adjacency matrix of a fixture graph.
#[must_use]
pub fn adjacency((nodes, pairs): Pairs) -> SparseMatrix {
    SparseMatrix::undirected(nodes, &pairs).expect("fixture pairs are in range")
}

#[must_use]
pub fn threads(count: usize) -> Parallelism {
    Parallelism::Threads(NonZeroUsize::new(count).expect("non-zero"))
}

/// Assignment holding exactly `ids`.
#[must_use]
pub fn ids(values: &[u64]) -> Assignment {
    Assignment::from_ids(values.iter().copied().map(ClusterId::new))
}
