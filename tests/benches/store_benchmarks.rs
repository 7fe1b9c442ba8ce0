//! # Reactive Store Benchmarks
//!
//! | Area | Scenario | Expectation |
//! |------|----------|-------------|
//! | Diff | one changed leaf, full scan | linear in state size |
//! | Diff | one changed leaf, declared scope | flat in state size |
//! | Snapshot | deep clone / deep compare | linear in state size |
//! | Dispatch | commit, no-op, locked-path rejection | microseconds |
//! | Dispatch | history mode dev / devlite / action | dev pays for a state snapshot |
//! | Dispatch | listener fan-out | linear in listener count |

use criterion::{criterion_group, criterion_main, Criterion};
use store_tests::benchmarks::{diff_engine, dispatch};

// ============================================================================
// DIFF ENGINE
// ============================================================================

fn bench_diff_engine(c: &mut Criterion) {
    diff_engine::register_benchmarks(c);
}

// ============================================================================
// DISPATCH PIPELINE
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    dispatch::register_benchmarks(c);
}

criterion_group!(benches, bench_diff_engine, bench_dispatch);

criterion_main!(benches);
