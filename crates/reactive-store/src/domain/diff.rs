//! # Diff Engine
//!
//! Computes which key paths differ between two state snapshots.
//!
//! ## Algorithm (full scan)
//!
//! 1. Enumerate every key path of `before` in ancestor-first order.
//! 2. A path missing from `after` is recorded as removed.
//! 3. A path present in both is deep-compared. If equal, every strict
//!    descendant is pruned, so an unchanged subtree costs one comparison.
//! 4. Paths present only in `after` are recorded as added.
//!
//! ## Scoped scan
//!
//! With [`DiffScope::Paths`] only the listed paths are examined. Ancestors
//! of every recorded path are back-filled with their own before/after
//! values, so every change set is closed under "parent of".

use super::path::KeyPath;
use super::path_util::{all_key_paths, deep_compare, try_get_at};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// A single changed path with the values on either side.
///
/// `None` means the path does not exist in that snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChangeRecord {
    pub key_path: KeyPath,
    pub value_before: Option<Value>,
    pub value_after: Option<Value>,
}

impl ChangeRecord {
    pub fn new(key_path: KeyPath, value_before: Option<Value>, value_after: Option<Value>) -> Self {
        Self {
            key_path,
            value_before,
            value_after,
        }
    }

    /// The path existed before and is gone now.
    pub fn is_removal(&self) -> bool {
        self.value_before.is_some() && self.value_after.is_none()
    }

    /// The path did not exist before.
    pub fn is_addition(&self) -> bool {
        self.value_before.is_none() && self.value_after.is_some()
    }
}

/// Changed paths keyed (and ordered) by path.
pub type ChangeSet = BTreeMap<KeyPath, ChangeRecord>;

/// Which paths the diff engine examines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DiffScope {
    /// Scan both snapshots completely.
    #[default]
    All,
    /// Only the listed paths (plus back-filled ancestors).
    Paths(BTreeSet<KeyPath>),
}

impl DiffScope {
    pub fn paths<I: IntoIterator<Item = KeyPath>>(paths: I) -> Self {
        DiffScope::Paths(paths.into_iter().collect())
    }
}

/// Compute the set of key paths whose values differ between `before` and
/// `after`.
pub fn changed_paths(before: &Value, after: &Value, scope: &DiffScope) -> ChangeSet {
    let mut changes = match scope {
        DiffScope::All => scan_all(before, after),
        DiffScope::Paths(paths) => scan_paths(before, after, paths),
    };
    backfill_ancestors(&mut changes, before, after);
    changes
}

fn scan_all(before: &Value, after: &Value) -> ChangeSet {
    let mut changes = ChangeSet::new();
    let mut unchanged: BTreeSet<KeyPath> = BTreeSet::new();

    for path in all_key_paths(before) {
        if path.ancestors().any(|ancestor| unchanged.contains(&ancestor)) {
            continue;
        }
        let Some(value_before) = try_get_at(before, &path) else {
            continue;
        };
        match try_get_at(after, &path) {
            None => {
                let record = ChangeRecord::new(path.clone(), Some(value_before.clone()), None);
                changes.insert(path, record);
            }
            Some(value_after) if deep_compare(value_before, value_after) => {
                unchanged.insert(path);
            }
            Some(value_after) => {
                let record = ChangeRecord::new(
                    path.clone(),
                    Some(value_before.clone()),
                    Some(value_after.clone()),
                );
                changes.insert(path, record);
            }
        }
    }

    for path in all_key_paths(after) {
        if try_get_at(before, &path).is_some() {
            continue;
        }
        let value_after = try_get_at(after, &path).cloned();
        changes.insert(path.clone(), ChangeRecord::new(path, None, value_after));
    }

    changes
}

fn scan_paths(before: &Value, after: &Value, scope: &BTreeSet<KeyPath>) -> ChangeSet {
    let mut changes = ChangeSet::new();

    for path in scope.iter().filter(|p| !p.is_root()) {
        let value_before = try_get_at(before, path);
        let value_after = try_get_at(after, path);
        let differs = match (value_before, value_after) {
            (None, None) => false,
            (Some(x), Some(y)) => !deep_compare(x, y),
            _ => true,
        };
        if differs {
            let record = ChangeRecord::new(path.clone(), value_before.cloned(), value_after.cloned());
            changes.insert(path.clone(), record);
        }
    }

    changes
}

/// Ensure every strict ancestor of a recorded path is itself recorded.
fn backfill_ancestors(changes: &mut ChangeSet, before: &Value, after: &Value) {
    let recorded: Vec<KeyPath> = changes.keys().cloned().collect();
    for path in recorded {
        for ancestor in path.ancestors() {
            if changes.contains_key(&ancestor) {
                break;
            }
            let record = ChangeRecord::new(
                ancestor.clone(),
                try_get_at(before, &ancestor).cloned(),
                try_get_at(after, &ancestor).cloned(),
            );
            changes.insert(ancestor, record);
        }
    }
}
