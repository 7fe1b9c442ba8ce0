//! # Reactive Store Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures/         # Tic-tac-toe slice reducer and UI-style wiring
//! ├── integration/      # Cross-module flows through the public store API
//! └── benchmarks/       # Criterion benchmark bodies
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p store-tests
//!
//! # By category
//! cargo test -p store-tests integration::
//!
//! # Benchmarks
//! cargo bench -p store-tests
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod benchmarks;
