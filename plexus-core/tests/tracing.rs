//! Instrumentation emitted by clustering runs through an injected dispatcher.

mod common;

use common::{adjacency, threads};
use plexus_core::{AgglomerativeBuilder, DenseMatrix, LinkClusteringBuilder};
use plexus_test_support::{graphs::two_triangles, tracing::RecordingLayer};
use rstest::{fixture, rstest};
use tracing::Level;

#[fixture]
fn layer() -> RecordingLayer {
    RecordingLayer::default()
}

#[rstest]
fn link_run_records_every_stage(layer: RecordingLayer) {
    let mut clustering = LinkClusteringBuilder::new()
        .with_parallelism(threads(2))
        .with_dispatch(layer.dispatch())
        .build();
    clustering
        .run(&adjacency(two_triangles()))
        .expect("valid graph");

    let run = layer.span_named("link.run").expect("run span");
    assert_eq!(run.field("nodes"), Some("6"));
    assert_eq!(run.field("eager"), Some("true"));

    let fill = layer.span_named("link.similarity_fill").expect("fill span");
    assert_eq!(fill.field("edges"), Some("6"));

    let hac = layer
        .span_named("hac.build_dendrogram")
        .expect("dendrogram span");
    assert_eq!(hac.field("items"), Some("6"));
    assert_eq!(hac.field("linkage"), Some("single"));

    let sweep = layer.span_named("link.density_sweep").expect("sweep span");
    assert_eq!(sweep.field("merges"), Some("5"));
    assert_eq!(sweep.field("workers"), Some("2"));

    assert!(layer.has_message("link clustering completed"));
    assert!(layer.has_message("density sweep finished"));
}

#[rstest]
fn ignored_cluster_count_is_reported(layer: RecordingLayer) {
    let mut clustering = LinkClusteringBuilder::new()
        .with_dispatch(layer.dispatch())
        .build();
    clustering
        .run_with_cluster_count(&adjacency(two_triangles()), 3)
        .expect("valid graph");
    let warnings = layer.events_at(Level::WARN);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].fields.get("cluster_count").map(String::as_str), Some("3"));
}

#[rstest]
fn point_clustering_records_its_spans(layer: RecordingLayer) {
    let dense = DenseMatrix::from_rows(vec![vec![1.0]]).expect("rows");
    let hac = AgglomerativeBuilder::new()
        .with_target_cluster_count(1)
        .with_dispatch(layer.dispatch())
        .build()
        .expect("valid configuration");
    let result = hac.cluster_matrix(&dense).expect("single row");
    assert_eq!(result.cluster_count(), 1);
    assert!(layer.span_named("hac.cluster_matrix").is_some());
    assert!(layer.span_named("similarity.point_fill").is_some());
    assert!(layer.has_message("agglomerative clustering completed"));
    assert!(layer.events_at(Level::ERROR).is_empty());
}

#[rstest]
fn injected_dispatcher_isolates_the_run(layer: RecordingLayer) {
    let _guard = tracing::dispatcher::set_default(&layer.dispatch());
    let isolated = RecordingLayer::default();
    LinkClusteringBuilder::new()
        .with_dispatch(isolated.dispatch())
        .build()
        .cluster(&adjacency(two_triangles()))
        .expect("valid graph");
    assert!(layer.spans().is_empty());
    assert!(!isolated.spans().is_empty());
}
