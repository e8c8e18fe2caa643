//! Shared test utilities for `plexus-core`.

use std::borrow::Cow;

use plexus_test_support::ci::property_test_profile::ProptestRunProfile;
use proptest::{prelude::*, test_runner::Config as ProptestConfig};

use crate::{
    error::MatrixError,
    matrix::{Layout, Matrix, SparseMatrix},
};

/// Builds a standard proptest configuration from the shared CI profile.
///
/// Keeps property suites aligned on the same `PLEXUS_PBT_CASES` and
/// `PLEXUS_PBT_FORK` interpretation.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

/// Generates a node count and a list of undirected pairs over it.
pub(crate) fn graph_strategy(
    max_nodes: usize,
    max_pairs: usize,
) -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (2..=max_nodes).prop_flat_map(move |nodes| {
        (
            Just(nodes),
            prop::collection::vec((0..nodes, 0..nodes), 0..=max_pairs),
        )
    })
}

/// Builds a symmetric adjacency matrix, panicking on invalid pairs.
pub(crate) fn undirected(nodes: usize, pairs: &[(usize, usize)]) -> SparseMatrix {
    SparseMatrix::undirected(nodes, pairs).expect("pairs are within the node count")
}

/// Sparse adjacency that reports each row's columns in descending order.
pub(crate) struct ReversedRows(pub(crate) SparseMatrix);

impl Matrix for ReversedRows {
    fn rows(&self) -> usize {
        self.0.rows()
    }

    fn columns(&self) -> usize {
        self.0.columns()
    }

    fn get(&self, row: usize, column: usize) -> Result<f64, MatrixError> {
        self.0.get(row, column)
    }

    fn non_zero_columns(&self, row: usize) -> Result<Cow<'_, [usize]>, MatrixError> {
        let mut columns = self.0.non_zero_columns(row)?.into_owned();
        columns.reverse();
        Ok(Cow::Owned(columns))
    }

    fn layout(&self) -> Layout {
        Layout::Sparse
    }
}
