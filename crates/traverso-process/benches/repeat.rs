//! Benchmarks for loop control.

#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use traverso_core::{Value, VertexId};
use traverso_process::{Compare, MemoryGraph, Traversal, TraversalSource};

fn chain(len: u64) -> TraversalSource {
    let mut graph = MemoryGraph::new();
    let ids: Vec<VertexId> = (1..=len).map(|id| graph.add_vertex(id)).collect();
    for pair in ids.windows(2) {
        graph.add_edge(pair[0], pair[1], "next").unwrap();
    }
    TraversalSource::new(Arc::new(graph))
}

/// Benchmark identity passes through a single loop.
fn bench_identity_passes(c: &mut Criterion) {
    let mut group = c.benchmark_group("repeat_identity");
    let g = TraversalSource::empty();

    for passes in [1u32, 10, 100] {
        group.throughput(Throughput::Elements(u64::from(passes)));
        group.bench_function(format!("passes_{passes}"), |b| {
            b.iter_batched(
                || {
                    g.inject([1i64])
                        .repeat(Traversal::anonymous().identity().unwrap())
                        .unwrap()
                        .times(passes)
                        .unwrap()
                },
                |mut t| black_box(t.to_list().unwrap()),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark walking a chain with every hop emitted.
fn bench_emit_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("repeat_emit_walk");

    for hops in [10u32, 100] {
        let g = chain(u64::from(hops) + 1);
        group.throughput(Throughput::Elements(u64::from(hops)));
        group.bench_function(format!("hops_{hops}"), |b| {
            b.iter_batched(
                || {
                    g.v([VertexId::new(1)])
                        .unwrap()
                        .repeat(Traversal::anonymous().out(&["next"]).unwrap())
                        .unwrap()
                        .emit_all()
                        .unwrap()
                        .times(hops)
                        .unwrap()
                },
                |mut t| black_box(t.to_list().unwrap()),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark a loop whose exit is decided by a nested traversal.
fn bench_traversal_predicate(c: &mut Criterion) {
    let g = chain(51);
    let target = Value::Vertex(VertexId::new(51));

    c.bench_function("repeat_until_traversal", |b| {
        b.iter_batched(
            || {
                g.v([VertexId::new(1)])
                    .unwrap()
                    .repeat(Traversal::anonymous().out(&["next"]).unwrap())
                    .unwrap()
                    .until_traversal(
                        Traversal::anonymous().is(Compare::eq(target.clone())).unwrap(),
                    )
                    .unwrap()
            },
            |mut t| black_box(t.to_list().unwrap()),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_identity_passes, bench_emit_walk, bench_traversal_predicate);
criterion_main!(benches);
