//! Benchmarks for traversals over a mapped file.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;
use std::sync::Arc;
use tempfile::NamedTempFile;
use zcgraph_core::{ComponentMode, Graph, GraphFile, GraphWriter, ParallelOptions, TraversalOptions};

/// Setup helper: a random graph with average out-degree `degree`, written and mapped
fn create_test_file(node_count: u64, degree: u64) -> (GraphFile, NamedTempFile) {
    let mut rng = StdRng::seed_from_u64(42);
    let edges: Vec<_> = (0..node_count * degree)
        .map(|_| (rng.random_range(0..node_count), rng.random_range(0..node_count)))
        .collect();

    let temp_file = NamedTempFile::new().unwrap();
    let graph = Graph::from_edges(node_count, edges);
    let writer = GraphWriter::default();
    writer.write_to_file(&graph, temp_file.path()).unwrap();
    (GraphFile::open(temp_file.path()).unwrap(), temp_file)
}

fn bench_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential");
    let (file, _guard) = create_test_file(100_000, 8);
    let view = file.view();
    group.throughput(Throughput::Elements(u64::from(view.edge_count())));

    group.bench_function("bfs", |b| {
        let options = TraversalOptions {
            record_distances: true,
            ..TraversalOptions::default()
        };
        b.iter(|| view.bfs(black_box(0), &options).unwrap());
    });

    group.bench_function("dfs", |b| {
        let options = TraversalOptions::default();
        b.iter(|| view.dfs(black_box(0), &options).unwrap());
    });

    group.bench_function("weak_components", |b| {
        b.iter(|| view.connected_components(ComponentMode::Weak).unwrap());
    });

    group.bench_function("degree_distribution", |b| {
        b.iter(|| black_box(view.degree_distribution()));
    });

    group.bench_function("shortest_path", |b| {
        b.iter(|| view.shortest_path(black_box(0), black_box(99_999)).unwrap());
    });

    group.finish();
}

fn bench_parallel_bfs(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_bfs");
    group.sample_size(20);
    let (file, _guard) = create_test_file(1_000_000, 8);
    let view = file.view();
    group.throughput(Throughput::Elements(u64::from(view.edge_count())));

    group.bench_function("sequential_baseline", |b| {
        let options = TraversalOptions {
            record_distances: true,
            ..TraversalOptions::default()
        };
        b.iter(|| view.bfs(0, &options).unwrap());
    });

    for workers in [1usize, 2, 4, 8] {
        // Build the pool once so thread start-up stays out of the measurement
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .unwrap();
        let options = ParallelOptions {
            workers,
            pool: Some(Arc::new(pool)),
            ..ParallelOptions::default()
        };
        group.bench_with_input(BenchmarkId::new("workers", workers), &options, |b, options| {
            b.iter(|| view.parallel_bfs(0, options).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sequential, bench_parallel_bfs);
criterion_main!(benches);
