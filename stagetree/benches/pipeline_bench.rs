//! Benchmarks for tree traversal and result table flushes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stagetree::prelude::*;
use stagetree::testing::wide_tree;
use tempfile::TempDir;

fn traversal_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("traverse_all");

    for depth in [2_u32, 4, 6] {
        let mut ctx = ExperimentContext::new();
        let nodes = wide_tree(ctx.tree_mut(), 4, 3, depth);
        let executor = TreeExecutor::new();

        group.bench_with_input(BenchmarkId::from_parameter(nodes), &nodes, |b, _| {
            let mut handler = stage_fn(|node: &mut TaskNode, _: &ComponentRegistry| {
                black_box(node.name());
                Ok(())
            });
            b.iter(|| black_box(executor.traverse_all(&mut ctx, &mut handler)));
        });
    }

    group.finish();
}

fn table_flush_benchmark(c: &mut Criterion) {
    let Ok(dir) = TempDir::new() else {
        return;
    };
    let config = TableConfig::new(dir.path().join("summary.txt").to_string_lossy(), 20, 10)
        .with_header_row(["corpus", "pa", "f1"])
        .with_multi_access(true);
    let Ok(mut table) = ResultTable::from_config(&config) else {
        return;
    };
    for row in 1..21 {
        if table.set_cell(row, 0, format!("corpus-{row}")).is_err() {
            return;
        }
    }

    c.bench_function("flush_multi_access", |b| {
        b.iter(|| black_box(table.flush()));
    });
}

criterion_group!(benches, traversal_benchmark, table_flush_benchmark);
criterion_main!(benches);
