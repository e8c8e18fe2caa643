//! Unit tests for edge derivation and edge similarity.

use proptest::prelude::*;
use rstest::rstest;

use super::{edge_similarity::shared_endpoint, *};
use crate::{
    error::MatrixError,
    matrix::{DenseMatrix, SparseMatrix},
    similarity::SimilarityMatrix,
    test_utils::{ReversedRows, graph_strategy, suite_proptest_config, undirected},
};

#[rstest]
#[case::symmetric(vec![(0, 1, 1.0), (1, 0, 1.0)], vec![Edge::new(1, 0)])]
#[case::upper_only(vec![(0, 1, 1.0)], vec![Edge::new(0, 1)])]
#[case::lower_only(vec![(1, 0, 1.0)], vec![Edge::new(1, 0)])]
#[case::self_loop(vec![(1, 1, 1.0)], vec![])]
fn edges_are_emitted_once_per_pair(
    #[case] triplets: Vec<(usize, usize, f64)>,
    #[case] expected: Vec<Edge>,
) {
    let matrix = SparseMatrix::from_triplets(2, 2, triplets).expect("cells are in bounds");
    let edges = EdgeList::from_adjacency(&matrix).expect("square matrix");
    assert_eq!(edges.as_slice(), expected.as_slice());
    assert_eq!(edges.node_count(), 2);
}

#[rstest]
fn edges_follow_row_discovery_order() {
    let matrix = undirected(4, &[(0, 1), (1, 2), (0, 2), (2, 3)]);
    let edges = EdgeList::from_adjacency(&matrix).expect("square matrix");
    assert_eq!(
        edges.as_slice(),
        &[
            Edge::new(1, 0),
            Edge::new(2, 0),
            Edge::new(2, 1),
            Edge::new(3, 2),
        ]
    );
}

#[rstest]
fn adjacency_rejects_rectangular_matrix() {
    let matrix = DenseMatrix::from_rows(vec![vec![0.0, 1.0, 0.0]]).expect("one row");
    let err = AdjacencyIndex::from_matrix(&matrix).expect_err("1x3 is not square");
    assert_eq!(err, MatrixError::NotSquare { rows: 1, columns: 3 });
}

#[rstest]
fn adjacency_sorts_unsorted_rows() {
    let inner = undirected(4, &[(0, 1), (0, 2), (0, 3)]);
    let adjacency =
        AdjacencyIndex::from_matrix(&ReversedRows(inner.clone())).expect("square matrix");
    assert_eq!(adjacency.neighbours(0), &[1, 2, 3]);
    assert_eq!(
        adjacency,
        AdjacencyIndex::from_matrix(&inner).expect("square matrix")
    );
    assert!(adjacency.neighbours(9).is_empty());
}

/// Builds a symmetric weighted adjacency matrix.
fn weighted(nodes: usize, edges: &[(usize, usize, f64)]) -> SparseMatrix {
    SparseMatrix::from_triplets(
        nodes,
        nodes,
        edges
            .iter()
            .flat_map(|&(a, b, weight)| [(a, b, weight), (b, a, weight)]),
    )
    .expect("cells are in bounds")
}

#[rstest]
fn adjacency_keeps_weights_aligned_with_sorted_columns() {
    let inner = weighted(4, &[(0, 1, 0.5), (0, 2, 2.0), (0, 3, -1.0)]);
    let adjacency = AdjacencyIndex::from_matrix(&ReversedRows(inner)).expect("square matrix");
    assert_eq!(adjacency.neighbours(0), &[1, 2, 3]);
    assert_eq!(adjacency.weights(0), &[0.5, 2.0, -1.0]);
    assert_eq!(adjacency.weight(0, 2), Some(2.0));
    assert_eq!(adjacency.weight(1, 2), None);
}

#[rstest]
fn weighted_tanimoto_matches_hand_computation() {
    // Imposts 1 and 2 share keystone 0. Node 1 has positive weights {0: 2,
    // 3: 4} and node 2 has {0: 1}, giving vectors {0: 1, 1: 0.5, 3: 2} and
    // {0: 1, 2: 1}: dot 1, norms 5.25 and 2, so 1 / (5.25 + 2 - 1).
    let adjacency =
        AdjacencyIndex::from_matrix(&weighted(4, &[(0, 1, 2.0), (1, 3, 4.0), (0, 2, 1.0)]))
            .expect("square matrix");
    let score = WeightedEdgeSimilarity.similarity(&adjacency, Edge::new(1, 0), Edge::new(2, 0));
    assert!((score - 0.16).abs() < 1e-12, "got {score}");
}

#[rstest]
fn weighted_similarity_ignores_non_positive_weights() {
    // Node 2 only reaches the keystone with a negative weight.
    let adjacency = AdjacencyIndex::from_matrix(&weighted(3, &[(0, 1, 1.0), (0, 2, -3.0)]))
        .expect("square matrix");
    let score = WeightedEdgeSimilarity.similarity(&adjacency, Edge::new(1, 0), Edge::new(2, 0));
    assert_eq!(score, 0.0);
}

#[rstest]
fn unit_weights_score_triangle_edges_as_identical() {
    let adjacency =
        AdjacencyIndex::from_matrix(&undirected(3, &[(0, 1), (1, 2), (0, 2)])).expect("square");
    let score = WeightedEdgeSimilarity.similarity(&adjacency, Edge::new(1, 0), Edge::new(2, 1));
    assert!((score - 1.0).abs() < 1e-12, "got {score}");
}

#[rstest]
#[case::from_from(Edge::new(1, 0), Edge::new(1, 2), Some((0, 2)))]
#[case::from_to(Edge::new(1, 0), Edge::new(2, 1), Some((0, 2)))]
#[case::to_from(Edge::new(0, 1), Edge::new(1, 2), Some((0, 2)))]
#[case::to_to(Edge::new(0, 1), Edge::new(2, 1), Some((0, 2)))]
#[case::disjoint(Edge::new(0, 1), Edge::new(2, 3), None)]
fn keystone_is_found_for_every_endpoint_pairing(
    #[case] left: Edge,
    #[case] right: Edge,
    #[case] expected: Option<(usize, usize)>,
) {
    assert_eq!(shared_endpoint(left, right), expected);
}

#[rstest]
fn inclusive_jaccard_on_star_counts_keystone() {
    // Leaves of a star only neighbour the centre: {1, 0} vs {2, 0}.
    let adjacency =
        AdjacencyIndex::from_matrix(&undirected(3, &[(0, 1), (0, 2)])).expect("square matrix");
    let score = JaccardEdgeSimilarity.similarity(&adjacency, Edge::new(1, 0), Edge::new(2, 0));
    assert!((score - 1.0 / 3.0).abs() < 1e-12, "got {score}");
}

#[rstest]
fn exclusive_jaccard_ignores_imposts() {
    // Bipartite square 0-2, 0-3, 1-2, 1-3: imposts 2 and 3 both see {0, 1}.
    let adjacency = AdjacencyIndex::from_matrix(&undirected(4, &[(0, 2), (0, 3), (1, 2), (1, 3)]))
        .expect("square matrix");
    let left = Edge::new(2, 0);
    let right = Edge::new(3, 0);
    assert_eq!(KPartiteEdgeSimilarity.similarity(&adjacency, left, right), 1.0);
    assert!(JaccardEdgeSimilarity.similarity(&adjacency, left, right) < 1.0);
}

#[rstest]
fn disjoint_edges_score_zero() {
    let adjacency =
        AdjacencyIndex::from_matrix(&undirected(4, &[(0, 1), (2, 3)])).expect("square matrix");
    let (left, right) = (Edge::new(1, 0), Edge::new(3, 2));
    assert_eq!(JaccardEdgeSimilarity.similarity(&adjacency, left, right), 0.0);
    assert_eq!(KPartiteEdgeSimilarity.similarity(&adjacency, left, right), 0.0);
}

#[rstest]
fn eager_matches_lazy() {
    let adjacency = AdjacencyIndex::from_matrix(&undirected(
        5,
        &[(0, 1), (1, 2), (0, 2), (2, 3), (3, 4), (2, 4)],
    ))
    .expect("square matrix");
    let edges = EdgeList::from_index(&adjacency);
    let eager =
        EagerEdgeSimilarity::build(&edges, &adjacency, &JaccardEdgeSimilarity).expect("fill");
    let lazy = LazyEdgeSimilarity::new(&edges, &adjacency, &JaccardEdgeSimilarity);
    assert_eq!(eager.len(), lazy.len());
    for left in 0..edges.len() {
        for right in 0..edges.len() {
            assert_eq!(
                eager.similarity(left, right),
                lazy.similarity(left, right),
                "pair ({left}, {right})"
            );
        }
    }
    assert!(eager.stored_values() < edges.len() * edges.len());
}

proptest! {
    #![proptest_config(suite_proptest_config(64))]

    #[test]
    fn edge_similarities_are_symmetric_and_bounded(
        (nodes, pairs) in graph_strategy(8, 16),
    ) {
        let adjacency = AdjacencyIndex::from_matrix(&undirected(nodes, &pairs))
            .expect("square matrix");
        let edges = EdgeList::from_index(&adjacency);
        for left in edges.iter() {
            for right in edges.iter() {
                for score in [
                    JaccardEdgeSimilarity.similarity(&adjacency, left, right),
                    KPartiteEdgeSimilarity.similarity(&adjacency, left, right),
                ] {
                    prop_assert!((0.0..=1.0).contains(&score));
                }
                prop_assert_eq!(
                    JaccardEdgeSimilarity.similarity(&adjacency, left, right),
                    JaccardEdgeSimilarity.similarity(&adjacency, right, left)
                );
                prop_assert_eq!(
                    KPartiteEdgeSimilarity.similarity(&adjacency, left, right),
                    KPartiteEdgeSimilarity.similarity(&adjacency, right, left)
                );
            }
        }
    }

    #[test]
    fn weighted_similarity_is_symmetric_and_bounded(
        (nodes, pairs) in graph_strategy(8, 16),
        weights in prop::collection::vec(-2.0_f64..5.0, 16),
    ) {
        let cells: Vec<(usize, usize, f64)> = pairs
            .iter()
            .zip(&weights)
            .filter(|((a, b), _)| a != b)
            .map(|(&(a, b), &weight)| (a, b, weight))
            .collect();
        let adjacency = AdjacencyIndex::from_matrix(&weighted(nodes, &cells))
            .expect("square matrix");
        let edges = EdgeList::from_index(&adjacency);
        for left in edges.iter() {
            for right in edges.iter() {
                let forward = WeightedEdgeSimilarity.similarity(&adjacency, left, right);
                prop_assert!((0.0..=1.0 + 1e-12).contains(&forward));
                prop_assert_eq!(
                    forward,
                    WeightedEdgeSimilarity.similarity(&adjacency, right, left)
                );
            }
        }
    }

    #[test]
    fn every_undirected_pair_yields_one_edge(
        (nodes, pairs) in graph_strategy(8, 16),
    ) {
        let edges = EdgeList::from_adjacency(&undirected(nodes, &pairs))
            .expect("square matrix");
        let mut expected: Vec<(usize, usize)> = pairs
            .iter()
            .filter(|(a, b)| a != b)
            .map(|&(a, b)| (a.max(b), a.min(b)))
            .collect();
        expected.sort_unstable();
        expected.dedup();
        let mut found: Vec<(usize, usize)> = edges
            .iter()
            .map(|edge| (edge.from().max(edge.to()), edge.from().min(edge.to())))
            .collect();
        found.sort_unstable();
        prop_assert_eq!(found, expected);
    }
}
