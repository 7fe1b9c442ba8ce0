//! # Diff Engine Benchmarks
//!
//! Cost of diffing two snapshots as the state grows:
//! - full scan over a wide state where one leaf changed
//! - the same change with a declared scope
//! - deep clone and deep compare of the whole state

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use reactive_store::domain::{changed_paths, deep_clone, deep_compare, set_at, DiffScope, KeyPath};
use serde_json::{json, Map, Value};
use std::time::Duration;

/// `slices` top-level slices, each holding `rows` rows of small records.
pub fn wide_state(slices: usize, rows: usize) -> Value {
    let mut root = Map::new();
    for slice in 0..slices {
        let records: Vec<Value> = (0..rows)
            .map(|row| json!({"id": row, "label": format!("row-{row}"), "tags": ["a", "b"], "done": false}))
            .collect();
        root.insert(format!("slice{slice}"), json!({ "rows": records, "count": rows }));
    }
    Value::Object(root)
}

fn one_leaf_changed(before: &Value) -> (Value, KeyPath) {
    let mut after = before.clone();
    let path = KeyPath::root().key("slice0").key("rows").index(0).key("done");
    set_at(&mut after, &path, json!(true)).expect("path exists in wide_state");
    (after, path)
}

pub fn bench_full_vs_scoped_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff/one_leaf");
    group.measurement_time(Duration::from_secs(5));

    for rows in [10, 100, 1_000] {
        let before = wide_state(4, rows);
        let (after, path) = one_leaf_changed(&before);
        let scoped = DiffScope::paths([path]);

        group.throughput(Throughput::Elements((4 * rows) as u64));
        group.bench_with_input(BenchmarkId::new("full_scan", rows), &(&before, &after), |b, (x, y)| {
            b.iter(|| black_box(changed_paths(x, y, &DiffScope::All)))
        });
        group.bench_with_input(BenchmarkId::new("scoped", rows), &(&before, &after), |b, (x, y)| {
            b.iter(|| black_box(changed_paths(x, y, &scoped)))
        });
    }

    group.finish();
}

pub fn bench_clone_and_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff/snapshot");

    for rows in [100, 1_000] {
        let state = wide_state(4, rows);
        let copy = deep_clone(&state);

        group.bench_with_input(BenchmarkId::new("deep_clone", rows), &state, |b, s| {
            b.iter(|| black_box(deep_clone(s)))
        });
        group.bench_with_input(BenchmarkId::new("deep_compare_equal", rows), &(&state, &copy), |b, (x, y)| {
            b.iter(|| black_box(deep_compare(x, y)))
        });
    }

    group.finish();
}

pub fn register_benchmarks(c: &mut Criterion) {
    bench_full_vs_scoped_diff(c);
    bench_clone_and_compare(c);
}
