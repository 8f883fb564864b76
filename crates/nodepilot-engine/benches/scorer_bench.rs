// Criterion benchmarks for nodepilot-engine
//
// Run benchmarks with:
//   cargo bench -p nodepilot-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nodepilot_engine::scorer::{rank_nodes, score_node};
use nodepilot_engine::{Node, Strategy, Weights};

fn make_nodes(count: u32) -> Vec<Node> {
    (0..count)
        .map(|i| {
            Node::new(i, format!("node{}", i), "bench").with_metrics(
                (i as f64 * 37.0) % 280.0,
                50.0 + (i as f64 * 13.0) % 50.0,
                (i as f64 * 7.0) % 100.0,
            )
        })
        .collect()
}

fn bench_score_node(c: &mut Criterion) {
    let node = Node::new(0, "node0", "bench").with_metrics(42.0, 97.0, 31.0);
    let weights = Weights::default();

    c.bench_function("score_node", |b| {
        b.iter(|| score_node(black_box(&node), black_box(&weights)));
    });
}

fn bench_rank_nodes(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_nodes");

    for node_count in [5, 15, 50, 200].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(node_count),
            node_count,
            |b, &count| {
                let nodes = make_nodes(count);
                let weights = Weights::default();
                b.iter(|| rank_nodes(black_box(&nodes), black_box(&weights)));
            },
        );
    }

    group.finish();
}

fn bench_rank_nodes_per_strategy(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_nodes_per_strategy");
    let nodes = make_nodes(15);

    for strategy in Strategy::ALL {
        group.bench_function(strategy.to_string(), |b| {
            let weights = strategy.preset();
            b.iter(|| rank_nodes(black_box(&nodes), black_box(&weights)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_score_node,
    bench_rank_nodes,
    bench_rank_nodes_per_strategy,
);
criterion_main!(benches);
