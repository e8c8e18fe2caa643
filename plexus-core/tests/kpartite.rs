//! End-to-end tests for k-partite link clustering.

mod common;

use common::{adjacency, ids, threads};
use plexus_core::{
    AdjacencyIndex, ClusteringError, EdgeList, EdgeSimilarity, JaccardEdgeSimilarity,
    KPartiteEdgeSimilarity, KPartiteLinkClusteringBuilder, PartitionMap,
};
use plexus_test_support::{
    graphs::{random_graph, two_bicliques, two_bicliques_partitions},
    tracing::RecordingLayer,
};
use proptest::prelude::*;
use rstest::rstest;
use tracing::Level;

#[rstest]
#[case::eager(true)]
#[case::lazy(false)]
fn bicliques_become_two_communities(#[case] keep: bool) {
    let partitions = PartitionMap::new(2, two_bicliques_partitions()).expect("valid mapping");
    let mut clustering = KPartiteLinkClusteringBuilder::new()
        .with_partitions(partitions)
        .with_keep_similarity_matrix_in_memory(keep)
        .with_parallelism(threads(3))
        .build();
    let assignments = clustering
        .run(&adjacency(two_bicliques()))
        .expect("valid graph");

    let run = clustering.last_run().expect("run completed");
    assert_eq!(run.best_solution(), 6);
    assert!((run.best_density() - 1.0).abs() < 1e-12);
    assert_eq!(clustering.number_of_solutions(), 7);
    let first = ids(&[0]);
    let second = ids(&[1]);
    assert_eq!(
        assignments,
        vec![
            first.clone(),
            first.clone(),
            first.clone(),
            first,
            second.clone(),
            second.clone(),
            second.clone(),
            second,
        ]
    );
}

#[rstest]
fn missing_mapping_falls_back_to_one_partition_with_a_warning() {
    let layer = RecordingLayer::default();
    let mut clustering = KPartiteLinkClusteringBuilder::new()
        .with_dispatch(layer.dispatch())
        .build();
    clustering
        .run(&adjacency(two_bicliques()))
        .expect("valid graph");

    let run = clustering.last_run().expect("run completed");
    assert!(run.densities().iter().all(|&density| density == 0.0));
    assert_eq!(run.best_solution(), 0);
    assert!(
        layer
            .events_at(Level::WARN)
            .iter()
            .any(|event| event.message().is_some_and(|message| message.contains("partition")))
    );
}

#[rstest]
fn requested_cluster_count_is_ignored_with_a_warning() {
    let layer = RecordingLayer::default();
    let partitions = PartitionMap::new(2, two_bicliques_partitions()).expect("valid mapping");
    let mut clustering = KPartiteLinkClusteringBuilder::new()
        .with_partitions(partitions)
        .with_dispatch(layer.dispatch())
        .build();
    let assignments = clustering
        .run_with_cluster_count(&adjacency(two_bicliques()), 5)
        .expect("valid graph");

    assert_eq!(assignments.len(), 8);
    assert_eq!(clustering.last_run().expect("run completed").best_solution(), 6);
    let warnings = layer.events_at(Level::WARN);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].fields.get("cluster_count").map(String::as_str), Some("5"));
}

#[rstest]
fn mapping_must_cover_every_node() {
    let partitions = PartitionMap::new(2, vec![0, 1, 0]).expect("valid mapping");
    let mut clustering = KPartiteLinkClusteringBuilder::new()
        .with_partitions(partitions)
        .build();
    let err = clustering
        .run(&adjacency(two_bicliques()))
        .expect_err("mapping too short");
    assert_eq!(
        err,
        ClusteringError::PartitionMappingLength {
            mapped: 3,
            nodes: 8,
        }
    );
    assert!(err.is_invalid_argument());
    assert_eq!(
        clustering.solution(0).expect_err("no run"),
        ClusteringError::NoCompletedRun
    );
}

proptest! {
    #[test]
    fn edge_similarities_are_symmetric(seed in any::<u64>(), density in 0.1_f64..0.6) {
        let (nodes, pairs) = random_graph(10, density, seed);
        let graph = adjacency((nodes, pairs));
        let index = AdjacencyIndex::from_matrix(&graph).expect("square matrix");
        let edges = EdgeList::from_index(&index);
        for left in edges.iter() {
            for right in edges.iter() {
                prop_assert_eq!(
                    JaccardEdgeSimilarity.similarity(&index, left, right),
                    JaccardEdgeSimilarity.similarity(&index, right, left)
                );
                prop_assert_eq!(
                    KPartiteEdgeSimilarity.similarity(&index, left, right),
                    KPartiteEdgeSimilarity.similarity(&index, right, left)
                );
            }
        }
    }
}
