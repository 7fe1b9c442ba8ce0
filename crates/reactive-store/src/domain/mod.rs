//! Domain Layer - Pure state logic
//!
//! This layer contains:
//! - Typed key paths and tree-walking utilities
//! - The diff engine
//! - The lock manager
//! - The history log and diagnostic modes
//! - The action and command model
//!
//! RULES:
//! - No interior mutability
//! - No listener or reducer invocation
//! - Pure functions where possible

pub mod action;
pub mod diff;
pub mod history;
pub mod locks;
pub mod path;
pub mod path_util;

pub use action::{Action, Command, Dispatch, CONTROL_KEYS, KEYPATHS_TO_CHANGE};
pub use diff::{changed_paths, ChangeRecord, ChangeSet, DiffScope};
pub use history::{
    ChangeType, DiagnosticMode, EntryContext, HistoryEntry, HistoryLog, ListenerCounts, ListenerKind, SkipReason,
    SkippedDispatch,
};
pub use locks::{LockManager, LockReport};
pub use path::{KeyPath, SEPARATOR};
pub use path_util::{
    all_key_paths, deep_clone, deep_compare, deep_freeze, get_at, set_at, try_get_at, Frozen,
};
