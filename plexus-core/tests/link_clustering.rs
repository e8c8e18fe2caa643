//! End-to-end tests for link-community clustering.

mod common;

use common::{adjacency, ids, threads};
use plexus_core::{
    ClusteringOptions, LinkClusteringBuilder, Parallelism, SparseMatrix, StandardDensity,
    WeightedEdgeSimilarity, partition_density,
};
use plexus_test_support::graphs::{
    bridged_cliques, random_graph, two_triangles, two_triangles_and_isolated_node,
};
use rstest::rstest;

#[rstest]
fn two_triangles_are_separated() {
    let mut clustering = LinkClusteringBuilder::new().build();
    let assignments = clustering
        .run(&adjacency(two_triangles()))
        .expect("valid graph");

    let first = ids(&[0]);
    let second = ids(&[1]);
    assert_eq!(
        assignments,
        vec![
            first.clone(),
            first.clone(),
            first,
            second.clone(),
            second.clone(),
            second,
        ]
    );
    let run = clustering.last_run().expect("run completed");
    assert_eq!(run.dendrogram().cluster_count_at(run.best_solution()), 2);
    assert!((run.best_density() - 1.0).abs() < 1e-12);
}

#[rstest]
#[case::eager(true)]
#[case::lazy(false)]
fn weighted_triangles_are_separated(#[case] keep: bool) {
    let edges = [
        (0, 1, 3.0),
        (1, 2, 0.5),
        (0, 2, 1.0),
        (3, 4, 2.0),
        (4, 5, 2.0),
        (3, 5, 0.25),
    ];
    let matrix = SparseMatrix::from_triplets(
        6,
        6,
        edges
            .iter()
            .flat_map(|&(a, b, weight)| [(a, b, weight), (b, a, weight)]),
    )
    .expect("cells in range");
    let mut clustering = LinkClusteringBuilder::new()
        .with_edge_similarity(WeightedEdgeSimilarity)
        .with_keep_similarity_matrix_in_memory(keep)
        .build();
    let assignments = clustering.run(&matrix).expect("valid graph");

    let run = clustering.last_run().expect("run completed");
    assert_eq!(run.best_solution(), 4);
    assert!((run.best_density() - 1.0).abs() < 1e-12);
    let (first, second) = (ids(&[0]), ids(&[1]));
    assert_eq!(&assignments[..3], &[first.clone(), first.clone(), first]);
    assert_eq!(&assignments[3..], &[second.clone(), second.clone(), second]);
}

#[rstest]
fn isolated_node_has_empty_assignment() {
    let mut clustering = LinkClusteringBuilder::new().build();
    let assignments = clustering
        .run(&adjacency(two_triangles_and_isolated_node()))
        .expect("valid graph");
    assert_eq!(assignments.len(), 7);
    assert!(assignments[6].is_empty());
    assert!(assignments[..6].iter().all(|assignment| assignment.len() == 1));
}

#[rstest]
#[case::sparse(random_graph(24, 0.15, 11))]
#[case::dense(random_graph(16, 0.5, 3))]
#[case::cliques(bridged_cliques(4, 5))]
fn worker_count_does_not_change_results(#[case] graph: plexus_test_support::graphs::Pairs) {
    let matrix = adjacency(graph);
    let baseline = LinkClusteringBuilder::new()
        .with_parallelism(threads(1))
        .build()
        .cluster(&matrix)
        .expect("valid graph");
    for parallelism in [threads(2), threads(4), threads(7), Parallelism::Auto] {
        let other = LinkClusteringBuilder::new()
            .with_parallelism(parallelism)
            .build()
            .cluster(&matrix)
            .expect("valid graph");
        assert_eq!(baseline, other, "results differ under {parallelism:?}");
    }
}

#[rstest]
fn lazy_and_eager_similarity_agree() {
    let matrix = adjacency(bridged_cliques(3, 4));
    let options = ClusteringOptions::parse([("keep_similarity_matrix_in_memory", "false")])
        .expect("valid options");
    let lazy = LinkClusteringBuilder::from_options(&options)
        .build()
        .cluster(&matrix)
        .expect("valid graph");
    let eager = LinkClusteringBuilder::new()
        .build()
        .cluster(&matrix)
        .expect("valid graph");
    assert_eq!(lazy, eager);
}

#[rstest]
fn every_solution_density_matches_a_fresh_computation() {
    let mut clustering = LinkClusteringBuilder::new()
        .with_parallelism(threads(3))
        .build();
    clustering
        .run(&adjacency(random_graph(18, 0.25, 5)))
        .expect("valid graph");
    let run = clustering.last_run().expect("run completed");
    assert_eq!(clustering.number_of_solutions(), run.edges().len() - 1);
    for index in 0..clustering.number_of_solutions() {
        let grouping = run.dendrogram().replay(index).expect("index in range");
        let fresh =
            partition_density(run.edges(), &grouping, &StandardDensity).expect("never fails");
        let swept = clustering.solution_density(index).expect("index in range");
        assert!((fresh - swept).abs() < 1e-9, "solution {index}: {fresh} vs {swept}");
    }
}

#[rstest]
fn best_solution_assignments_match_the_run() {
    let mut clustering = LinkClusteringBuilder::new().build();
    let assignments = clustering
        .run(&adjacency(bridged_cliques(3, 4)))
        .expect("valid graph");
    let best = clustering.last_run().expect("run completed").best_solution();
    assert_eq!(clustering.solution(best).expect("index in range"), assignments);
}
