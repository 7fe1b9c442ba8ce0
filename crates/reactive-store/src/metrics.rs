//! Dispatch counters
//!
//! Rejections and no-op dispatches leave no history entry; these counters
//! (together with the `tracing` events) are where they show up.
//!
//! ## Usage
//!
//! ```
//! use reactive_store::metrics::Metrics;
//!
//! let metrics = Metrics::new();
//! metrics.record_dispatch();
//! metrics.record_no_op();
//! assert_eq!(metrics.snapshot().no_ops, 1);
//! ```

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for store operations.
#[derive(Debug, Default)]
pub struct Metrics {
    /// Total dispatch calls, including commands and rejections
    pub dispatches: AtomicU64,
    /// Dispatches that committed a new state
    pub commits: AtomicU64,
    /// Control commands applied
    pub commands: AtomicU64,
    /// Rejected because the whole state was locked
    pub rejected_locked: AtomicU64,
    /// Rejected because a locked key path would have changed
    pub rejected_locked_paths: AtomicU64,
    /// Rejected because dispatch was called from a reducer
    pub rejected_reentrant: AtomicU64,
    /// Reducers produced an identical state
    pub no_ops: AtomicU64,
    /// Listener invocations
    pub notifications: AtomicU64,
    /// Listener invocations skipped because the listener was already running
    /// or a nested commit superseded the notification
    pub notifications_skipped: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_dispatch(&self) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_command(&self) {
        self.commands.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_locked(&self) {
        self.rejected_locked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_locked_paths(&self) {
        self.rejected_locked_paths.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_reentrant(&self) {
        self.rejected_reentrant.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_no_op(&self) {
        self.no_ops.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one listener delivery attempt.
    pub fn record_notification(&self, delivered: bool) {
        if delivered {
            self.notifications.fetch_add(1, Ordering::Relaxed);
        } else {
            self.notifications_skipped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            dispatches: self.dispatches.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            commands: self.commands.load(Ordering::Relaxed),
            rejected_locked: self.rejected_locked.load(Ordering::Relaxed),
            rejected_locked_paths: self.rejected_locked_paths.load(Ordering::Relaxed),
            rejected_reentrant: self.rejected_reentrant.load(Ordering::Relaxed),
            no_ops: self.no_ops.load(Ordering::Relaxed),
            notifications: self.notifications.load(Ordering::Relaxed),
            notifications_skipped: self.notifications_skipped.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        for counter in [
            &self.dispatches,
            &self.commits,
            &self.commands,
            &self.rejected_locked,
            &self.rejected_locked_paths,
            &self.rejected_reentrant,
            &self.no_ops,
            &self.notifications,
            &self.notifications_skipped,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Point-in-time copy of [`Metrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub dispatches: u64,
    pub commits: u64,
    pub commands: u64,
    pub rejected_locked: u64,
    pub rejected_locked_paths: u64,
    pub rejected_reentrant: u64,
    pub no_ops: u64,
    pub notifications: u64,
    pub notifications_skipped: u64,
}

impl MetricsSnapshot {
    /// All rejections regardless of cause.
    pub fn rejected(&self) -> u64 {
        self.rejected_locked + self.rejected_locked_paths + self.rejected_reentrant
    }
}
