//! # History Log
//!
//! Append-only diagnostic record of what the store did. Never pruned, never
//! replayed. How much each entry carries depends on [`DiagnosticMode`]:
//!
//! | Mode | Entry contents |
//! |------|----------------|
//! | `dev` | action, changed paths, locked keys, listener counts, frozen state |
//! | `devlite` | action, changed paths |
//! | anything else | action only |

use super::diff::ChangeSet;
use super::path::KeyPath;
use super::path_util::{deep_freeze, Frozen};
use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Verbosity of the history log and of dispatch tracing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticMode {
    /// Full state, listener and lock snapshots per entry.
    #[default]
    Dev,
    /// Action and diff only.
    DevLite,
    /// Action only.
    #[serde(rename = "action")]
    ActionOnly,
}

impl DiagnosticMode {
    /// Dev and devlite emit per-step dispatch tracing.
    pub fn is_verbose(self) -> bool {
        matches!(self, DiagnosticMode::Dev | DiagnosticMode::DevLite)
    }
}

impl FromStr for DiagnosticMode {
    type Err = Infallible;

    /// Never fails: unknown modes select [`DiagnosticMode::ActionOnly`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "dev" => DiagnosticMode::Dev,
            "devlite" => DiagnosticMode::DevLite,
            _ => DiagnosticMode::ActionOnly,
        })
    }
}

impl fmt::Display for DiagnosticMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticMode::Dev => "dev",
            DiagnosticMode::DevLite => "devlite",
            DiagnosticMode::ActionOnly => "action",
        })
    }
}

/// What prompted a history entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    /// Reducers were (re)registered and the state initialized.
    Init,
    /// A dispatch committed a new state.
    State,
    AddListener,
    DelListener,
}

/// Which kind of listener an `ADD_LISTENER`/`DEL_LISTENER` entry refers to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "key_path", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListenerKind {
    Global,
    Partial(KeyPath),
}

/// Number of registered listeners at a point in time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ListenerCounts {
    pub global: usize,
    pub partial: BTreeMap<KeyPath, usize>,
}

impl ListenerCounts {
    pub fn total(&self) -> usize {
        self.global + self.partial.values().sum::<usize>()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub change_type: ChangeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listener: Option<ListenerKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_paths: Option<ChangeSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_keys: Option<Vec<KeyPath>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listeners: Option<ListenerCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Frozen>,
}

/// Why a dispatch left the state untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    Locked,
    LockedPaths,
    NoChange,
    Reentrant,
}

/// A rejected or no-op dispatch.
///
/// Stored apart from the entries: [`HistoryLog::entries`] grows only on
/// reducer registration, commits and listener changes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkippedDispatch {
    pub reason: SkipReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<KeyPath>,
}

/// Everything an entry may capture; the mode decides what is kept.
pub struct EntryContext<'a> {
    pub action: Option<Value>,
    pub listener: Option<ListenerKind>,
    pub changes: Option<&'a ChangeSet>,
    pub locked_keys: &'a BTreeSet<KeyPath>,
    pub listeners: ListenerCounts,
    pub state: &'a Value,
}

#[derive(Clone, Debug, Default)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
    skipped: Vec<SkippedDispatch>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry populated according to `mode`.
    pub fn record(&mut self, mode: DiagnosticMode, change_type: ChangeType, context: EntryContext<'_>) {
        let with_diff = mode.is_verbose();
        let with_snapshots = mode == DiagnosticMode::Dev;

        self.entries.push(HistoryEntry {
            change_type,
            action: context.action,
            listener: context.listener,
            changed_paths: context.changes.filter(|_| with_diff).cloned(),
            locked_keys: with_snapshots.then(|| context.locked_keys.iter().cloned().collect()),
            listeners: with_snapshots.then_some(context.listeners),
            state: with_snapshots.then(|| deep_freeze(context.state)),
        });
    }

    pub fn record_skipped(&mut self, skipped: SkippedDispatch) {
        self.skipped.push(skipped);
    }

    /// Rejected and no-op dispatches, oldest first.
    pub fn skipped(&self) -> &[SkippedDispatch] {
        &self.skipped
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Entries of one change type, oldest first.
    pub fn of_type(&self, change_type: ChangeType) -> Vec<&HistoryEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.change_type == change_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<Value, StoreError> {
        Ok(serde_json::to_value(&self.entries)?)
    }

    pub fn skipped_to_json(&self) -> Result<Value, StoreError> {
        Ok(serde_json::to_value(&self.skipped)?)
    }
}
