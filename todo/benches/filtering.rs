//! Filtering and cache patch benchmarks
//!
//! Measures the pure functions that run on every keystroke and every
//! mutation result, over lists of increasing size.
//!
//! Run with: `cargo bench -p graphql-todo`

#![allow(missing_docs)] // Benchmarks don't need extensive docs

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use graphql_todo::{filter_todos, toggled_list, without_todo, FilterStats, Todo, TodoFilter, TodoId};

const SIZES: [usize; 3] = [10, 100, 1_000];

fn todos(count: usize) -> Vec<Todo> {
    (0..count)
        .map(|i| Todo::new(i.to_string(), format!("Task {i} buy milk {}", i % 7), i % 3 == 0))
        .collect()
}

fn benchmark_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_todos");

    for size in SIZES {
        let list = todos(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("all", size), &list, |b, list| {
            b.iter(|| filter_todos(black_box(list), TodoFilter::All, ""));
        });

        group.bench_with_input(BenchmarkId::new("active_with_keyword", size), &list, |b, list| {
            b.iter(|| filter_todos(black_box(list), TodoFilter::Active, black_box("MILK 3")));
        });
    }

    group.finish();
}

fn benchmark_patches(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_patch");

    for size in SIZES {
        let list = todos(size);
        let middle = Todo {
            completed: true,
            ..list[size / 2].clone()
        };
        let id = TodoId::new((size / 2).to_string());
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("toggle", size), &list, |b, list| {
            b.iter(|| toggled_list(black_box(list), black_box(&middle)));
        });

        group.bench_with_input(BenchmarkId::new("delete", size), &list, |b, list| {
            b.iter(|| without_todo(black_box(list), black_box(&id)));
        });
    }

    group.finish();
}

fn benchmark_stats(c: &mut Criterion) {
    c.bench_function("filter_stats_derive", |b| {
        b.iter(|| FilterStats::derive(black_box(TodoFilter::Completed), black_box("groceries")));
    });
}

criterion_group!(benches, benchmark_filter, benchmark_patches, benchmark_stats);
criterion_main!(benches);
