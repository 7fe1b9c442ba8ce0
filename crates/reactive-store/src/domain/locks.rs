//! Lock manager: a full-state lock flag plus individually locked key paths.
//!
//! A locked path protects its whole subtree: locking `board` rejects a
//! write to `board.3`. A change recorded on an ancestor of a locked path is
//! rejected only when it reaches into the locked subtree, so locking
//! `board.0` still lets `board.4` change (the diff reports `board` as
//! changed too) but rejects replacing `board` with a shorter array.

use super::diff::{ChangeRecord, ChangeSet};
use super::path::KeyPath;
use super::path_util::{deep_compare, try_get_at};
use serde::Serialize;
use std::collections::BTreeSet;

/// Which requested paths actually changed lock state.
///
/// Informational only; it never affects the outcome of a dispatch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LockReport {
    /// Paths that were newly locked (or unlocked).
    pub changed: Vec<KeyPath>,
    /// Paths that were already in the requested state.
    pub unchanged: Vec<KeyPath>,
}

#[derive(Clone, Debug, Default)]
pub struct LockManager {
    state_locked: bool,
    locked_paths: BTreeSet<KeyPath>,
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_state(&mut self) {
        self.state_locked = true;
    }

    pub fn unlock_state(&mut self) {
        self.state_locked = false;
    }

    pub fn is_state_locked(&self) -> bool {
        self.state_locked
    }

    pub fn locked_paths(&self) -> &BTreeSet<KeyPath> {
        &self.locked_paths
    }

    pub fn lock_paths<'a, I>(&mut self, paths: I) -> LockReport
    where
        I: IntoIterator<Item = &'a KeyPath>,
    {
        let mut report = LockReport::default();
        for path in paths {
            if self.locked_paths.insert(path.clone()) {
                report.changed.push(path.clone());
            } else {
                report.unchanged.push(path.clone());
            }
        }
        report
    }

    pub fn unlock_paths<'a, I>(&mut self, paths: I) -> LockReport
    where
        I: IntoIterator<Item = &'a KeyPath>,
    {
        let mut report = LockReport::default();
        for path in paths {
            if self.locked_paths.remove(path) {
                report.changed.push(path.clone());
            } else {
                report.unchanged.push(path.clone());
            }
        }
        report
    }

    /// Changed paths that collide with a locked path.
    pub fn conflicts(&self, changes: &ChangeSet) -> Vec<KeyPath> {
        changes
            .values()
            .filter(|record| self.is_blocked(record))
            .map(|record| record.key_path.clone())
            .collect()
    }

    /// True if the change set may not be committed.
    pub fn rejects(&self, changes: &ChangeSet) -> bool {
        if self.state_locked {
            return true;
        }
        changes.values().any(|record| self.is_blocked(record))
    }

    fn is_blocked(&self, record: &ChangeRecord) -> bool {
        let changed = &record.key_path;
        self.locked_paths.iter().any(|locked| {
            if locked == changed || changed.is_descendant_of(locked) {
                return true;
            }
            changed.is_ancestor_of(locked) && reaches_into(record, locked)
        })
    }
}

/// True if the change recorded on an ancestor of `locked` alters the value
/// at `locked`.
fn reaches_into(record: &ChangeRecord, locked: &KeyPath) -> bool {
    let relative = KeyPath::from_segments(locked.segments()[record.key_path.len()..].iter().cloned());
    let before = record.value_before.as_ref().and_then(|v| try_get_at(v, &relative));
    let after = record.value_after.as_ref().and_then(|v| try_get_at(v, &relative));
    match (before, after) {
        (None, None) => false,
        (Some(x), Some(y)) => !deep_compare(x, y),
        _ => true,
    }
}
