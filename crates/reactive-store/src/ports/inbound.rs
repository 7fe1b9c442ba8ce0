//! Inbound Ports (Driving Ports)
//!
//! The API that UI components, click handlers and other collaborators use
//! to drive a store.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::reducer::BoxedReducer;
use crate::domain::{ChangeRecord, ChangeSet, Dispatch, KeyPath};
use crate::error::StoreError;

/// Why a dispatch did or did not commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchReason {
    /// Committed normally.
    None,
    /// A control command was applied; reducers did not run.
    Control,
    /// The whole state is locked.
    Locked,
    /// The change set touched a locked key path.
    LockedPaths,
    /// Reducers produced a deep-equal state.
    NoChange,
    /// Dispatch was called from inside a reducer.
    Reentrant,
}

impl fmt::Display for DispatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DispatchReason::None => "none",
            DispatchReason::Control => "control",
            DispatchReason::Locked => "locked",
            DispatchReason::LockedPaths => "locked_paths",
            DispatchReason::NoChange => "no_change",
            DispatchReason::Reentrant => "reentrant",
        })
    }
}

/// Result of a single dispatch.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DispatchOutcome {
    /// Whether a new state was committed
    pub committed: bool,
    pub reason: DispatchReason,
    /// Deep copy of the state as this dispatch left it
    pub state: Value,
    /// Computed change set (empty when reducers did not run)
    pub changes: ChangeSet,
    /// Changed paths that collided with locks (only for `LockedPaths`)
    pub conflicts: Vec<KeyPath>,
}

impl DispatchOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(
            self.reason,
            DispatchReason::Locked | DispatchReason::LockedPaths | DispatchReason::Reentrant
        )
    }
}

/// Primary store API (Driving Port)
pub trait StoreApi<A> {
    /// Handle returned by the subscribe operations.
    type Subscription;

    /// Register slice reducers and rebuild the state from their initial
    /// values. Replaces any previously registered reducers.
    fn combine_reducers(&self, slices: BTreeMap<String, BoxedReducer<A>>) -> Result<(), StoreError>;

    /// Run one action or control command through the pipeline.
    fn dispatch(&self, dispatch: Dispatch<A>) -> DispatchOutcome;

    /// Deep copy of the current state.
    fn get_state(&self) -> Value;

    /// Register a listener called with the committed state after every
    /// commit.
    fn subscribe(&self, listener: Box<dyn FnMut(&Value)>) -> Self::Subscription;

    /// Register a listener called with the change record of `path` after
    /// every commit that changed it.
    fn subscribe_to(&self, path: KeyPath, listener: Box<dyn FnMut(&ChangeRecord)>) -> Self::Subscription;
}
