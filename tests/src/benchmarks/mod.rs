//! # Reactive Store Benchmarks
//!
//! Benchmark bodies, registered from `benches/store_benchmarks.rs`.

pub mod diff_engine;
