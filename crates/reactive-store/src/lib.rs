//! # Reactive Store
//!
//! A single-threaded, in-memory reactive state container. Callers register
//! pure slice reducers, dispatch actions, and subscribe to the whole state
//! or to individual key paths. Parts of the state (or all of it) can be
//! locked against further writes.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure logic, no callbacks
//!   - `KeyPath`, tree-walking getter/setter, deep clone/freeze/compare
//!   - `changed_paths`: the diff engine
//!   - `LockManager`: full-state lock and locked key paths
//!   - `HistoryLog`: append-only diagnostic record
//!   - `Dispatch`, `Command`, `Action`: what can be dispatched
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `StoreApi`: Driving port (inbound API)
//!   - `Reducer`: State transition functions supplied by callers
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `Store`: Implements `StoreApi`
//!   - `SubscriptionRegistry`, `ReducerRegistry`
//!
//! ## Invariants
//!
//! - **Clone isolation**: state handed out is always a deep copy
//! - **Lock soundness**: a committed change never touches a locked path
//! - **Idempotence**: an identical reducer output records nothing and
//!   notifies nobody
//!
//! ## Usage Example
//!
//! ```
//! use reactive_store::{reducer, Action, Command, KeyPath, Store};
//! use serde_json::{json, Value};
//!
//! let store: Store<i64> = Store::new();
//! store
//!     .combine_reducers([(
//!         "counter",
//!         reducer(|slice: Option<Value>, delta: &i64| {
//!             json!(slice.and_then(|v| v.as_i64()).unwrap_or(0) + delta)
//!         }),
//!     )])
//!     .unwrap();
//!
//! store.subscribe_to(KeyPath::root().key("counter"), |change| {
//!     println!("counter: {:?} -> {:?}", change.value_before, change.value_after);
//! });
//!
//! assert!(store.dispatch(Action::new(2)).committed);
//! store.dispatch(Command::LockState);
//! assert!(!store.dispatch(Action::new(2)).committed);
//! assert_eq!(store.get_state(), json!({"counter": 2}));
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use config::{StoreConfig, StoreConfigBuilder};
pub use domain::{
    Action, ChangeRecord, ChangeSet, ChangeType, Command, DiagnosticMode, DiffScope, Dispatch, Frozen,
    HistoryEntry, KeyPath, ListenerCounts, ListenerKind, SkipReason, SkippedDispatch,
};
pub use error::StoreError;
pub use metrics::{Metrics, MetricsSnapshot};
pub use ports::{fold_reducers, reducer, BoxedReducer, DispatchOutcome, DispatchReason, Reducer, StoreApi};
pub use service::{ListenerId, Store, Subscription};
