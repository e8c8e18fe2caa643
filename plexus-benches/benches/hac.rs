//! Agglomerative clustering benchmarks.
//!
//! Measures the point pipeline (parallel similarity fill followed by the
//! best-partner engine) for every linkage.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use plexus_benches::{error::BenchSetupError, params::PointBenchParams, source::blob_points};
use plexus_core::{AgglomerativeBuilder, Linkage};

/// Seed used for all synthetic points in this benchmark.
const SEED: u64 = 7;

/// Point counts to benchmark.
const POINT_COUNTS: &[usize] = &[100, 300];

const LINKAGES: &[Linkage] = &[
    Linkage::Single,
    Linkage::Complete,
    Linkage::Mean,
    Linkage::Median,
];

fn hac_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let mut group = c.benchmark_group("agglomerative");
    group.sample_size(10);

    for &points in POINT_COUNTS {
        let rows = blob_points(points, 5, 8, SEED)?;
        for &linkage in LINKAGES {
            let hac = AgglomerativeBuilder::new()
                .with_linkage(linkage)
                .with_target_cluster_count(5)
                .build()?;
            let params = PointBenchParams {
                points,
                linkage: linkage.as_str(),
            };
            group.bench_with_input(BenchmarkId::from_parameter(params), &rows, |b, rows| {
                b.iter(|| hac.cluster_matrix(rows));
            });
        }
    }

    group.finish();
    Ok(())
}

fn hac(c: &mut Criterion) {
    if let Err(err) = hac_impl(c) {
        panic!("hac benchmark setup failed: {err}");
    }
}

criterion_group!(benches, hac);
criterion_main!(benches);
