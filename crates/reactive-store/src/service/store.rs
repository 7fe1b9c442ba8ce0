//! # Store
//!
//! The state container. Owns the state, the reducers, the locks, the
//! listeners and the history log, and runs every dispatch through one
//! short-circuiting pipeline:
//!
//! | Step | Condition | Outcome |
//! |------|-----------|---------|
//! | 0 | called from inside a reducer | `Reentrant` |
//! | 1-3 | control command | apply it, `Control` |
//! | 4 | whole state locked | `Locked` |
//! | 5-6 | run reducers on a clone, diff | |
//! | 7 | change touches a locked path | `LockedPaths` |
//! | 8 | empty change set | `NoChange` |
//! | 9 | otherwise | commit, history, notify, `None` |
//!
//! Only step 9 appends a `STATE` history entry. Steps 0, 4, 7 and 8 are
//! kept in the log's separate list of skipped dispatches.
//!
//! A declared `KEYPATHS_TO_CHANGE` narrows the reported change set only;
//! locked paths outside it are still checked against the reducer output.
//!
//! ## Reentrancy
//!
//! A `Store` is a cheap handle (`Rc`) and is neither `Send` nor `Sync`.
//! No internal borrow is held while user code runs, so reducers and
//! listeners may read the store and subscribe. A reducer may not dispatch
//! or re-register reducers; a listener may dispatch, which runs a complete
//! nested dispatch against the already-committed state.
//!
//! Each commit gets a sequence number. An outer commit's pending
//! notification is dropped once a nested commit has superseded it: any
//! newer commit supersedes a global listener, a newer commit that changed
//! the watched path supersedes a partial one. Listeners therefore never
//! see states out of order.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, info, warn};

use super::reducers::ReducerRegistry;
use super::subscriptions::{ListenerId, PendingNotification, SubscriptionRegistry};
use crate::config::StoreConfig;
use crate::domain::{
    changed_paths, deep_clone, get_at, Action, ChangeRecord, ChangeSet, ChangeType, Command, DiagnosticMode,
    DiffScope, Dispatch, EntryContext, HistoryEntry, HistoryLog, KeyPath, ListenerCounts, ListenerKind,
    LockManager, SkipReason, SkippedDispatch,
};
use crate::error::StoreError;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::ports::{BoxedReducer, DispatchOutcome, DispatchReason, StoreApi};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Reducing,
    Notifying,
}

/// Restores the previous phase on drop, including when a reducer or
/// listener panics.
struct PhaseGuard<'a> {
    cell: &'a Cell<Phase>,
    previous: Phase,
}

impl<'a> PhaseGuard<'a> {
    fn enter(cell: &'a Cell<Phase>, phase: Phase) -> Self {
        let previous = cell.replace(phase);
        Self { cell, previous }
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.cell.set(self.previous);
    }
}

struct Inner<A> {
    log_dispatches: bool,
    mode: Cell<DiagnosticMode>,
    phase: Cell<Phase>,
    state: RefCell<Value>,
    reducers: RefCell<ReducerRegistry<A>>,
    locks: RefCell<LockManager>,
    listeners: RefCell<SubscriptionRegistry>,
    history: RefCell<HistoryLog>,
    metrics: Metrics,
    commit_seq: Cell<u64>,
    /// Latest commit that changed each path, filled by nested commits only.
    path_versions: RefCell<BTreeMap<KeyPath, u64>>,
}

/// Handle to a reactive state container.
///
/// Cloning the handle does not clone the container.
pub struct Store<A> {
    inner: Rc<Inner<A>>,
}

impl<A> Clone for Store<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A> Default for Store<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for Store<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("mode", &self.inner.mode.get())
            .field("phase", &self.inner.phase.get())
            .field("state_locked", &self.is_state_locked())
            .field("history_len", &self.inner.history.try_borrow().map(|h| h.len()).ok())
            .finish()
    }
}

impl<A> Store<A> {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            inner: Rc::new(Inner {
                log_dispatches: config.log_dispatches,
                mode: Cell::new(config.mode),
                phase: Cell::new(Phase::Idle),
                state: RefCell::new(Value::Object(Default::default())),
                reducers: RefCell::new(ReducerRegistry::default()),
                locks: RefCell::new(LockManager::new()),
                listeners: RefCell::new(SubscriptionRegistry::new()),
                history: RefCell::new(HistoryLog::new()),
                metrics: Metrics::new(),
                commit_seq: Cell::new(0),
                path_versions: RefCell::new(BTreeMap::new()),
            }),
        }
    }

    /// Deep copy of the current state.
    pub fn get_state(&self) -> Value {
        deep_clone(&self.inner.state.borrow())
    }

    /// Deep copy of the value at `path`.
    pub fn get_at(&self, path: &KeyPath) -> Result<Value, StoreError> {
        get_at(&self.inner.state.borrow(), path).map(deep_clone)
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.inner.history.borrow().entries().to_vec()
    }

    pub fn history_of(&self, change_type: ChangeType) -> Vec<HistoryEntry> {
        self.inner
            .history
            .borrow()
            .of_type(change_type)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn history_json(&self) -> Result<Value, StoreError> {
        self.inner.history.borrow().to_json()
    }

    /// Rejected and no-op dispatches, oldest first.
    pub fn skipped_dispatches(&self) -> Vec<SkippedDispatch> {
        self.inner.history.borrow().skipped().to_vec()
    }

    pub fn mode(&self) -> DiagnosticMode {
        self.inner.mode.get()
    }

    pub fn is_state_locked(&self) -> bool {
        self.inner.locks.borrow().is_state_locked()
    }

    pub fn locked_paths(&self) -> BTreeSet<KeyPath> {
        self.inner.locks.borrow().locked_paths().clone()
    }

    pub fn listener_counts(&self) -> ListenerCounts {
        self.inner.listeners.borrow().counts()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// True while reducers of this store are running.
    pub fn is_reducing(&self) -> bool {
        self.inner.phase.get() == Phase::Reducing
    }

    /// Register a global listener, called with the committed state after
    /// every commit.
    pub fn subscribe<F>(&self, listener: F) -> Subscription<A>
    where
        F: FnMut(&Value) + 'static,
    {
        let id = self.inner.listeners.borrow_mut().subscribe_global(listener);
        self.track_listener(id, ListenerKind::Global)
    }

    /// Register a partial listener, called with the change record of `path`
    /// after every commit that changed it.
    pub fn subscribe_to<F>(&self, path: KeyPath, listener: F) -> Subscription<A>
    where
        F: FnMut(&ChangeRecord) + 'static,
    {
        let id = self
            .inner
            .listeners
            .borrow_mut()
            .subscribe_partial(path.clone(), listener);
        self.track_listener(id, ListenerKind::Partial(path))
    }

    fn track_listener(&self, id: ListenerId, kind: ListenerKind) -> Subscription<A> {
        debug!(listener = %id, kind = ?kind, "Listener added");
        self.record(ChangeType::AddListener, None, Some(kind.clone()), None);
        Subscription {
            store: Rc::downgrade(&self.inner),
            id,
            kind,
        }
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let removed = self.inner.listeners.borrow_mut().unsubscribe(id);
        match removed {
            Some(kind) => {
                debug!(listener = %id, kind = ?kind, "Listener removed");
                self.record(ChangeType::DelListener, None, Some(kind), None);
                true
            }
            None => false,
        }
    }

    /// Append a history entry. Must not be called while any internal
    /// borrow is held mutably.
    fn record(
        &self,
        change_type: ChangeType,
        action: Option<Value>,
        listener: Option<ListenerKind>,
        changes: Option<&ChangeSet>,
    ) {
        let locks = self.inner.locks.borrow();
        let state = self.inner.state.borrow();
        let context = EntryContext {
            action,
            listener,
            changes,
            locked_keys: locks.locked_paths(),
            listeners: self.inner.listeners.borrow().counts(),
            state: &state,
        };
        self.inner
            .history
            .borrow_mut()
            .record(self.inner.mode.get(), change_type, context);
    }

    fn record_skipped(&self, reason: SkipReason, action: Option<Value>, conflicts: Vec<KeyPath>) {
        self.inner.history.borrow_mut().record_skipped(SkippedDispatch {
            reason,
            action,
            conflicts,
        });
    }

    /// True if a commit newer than `seq` already reached this listener.
    fn is_superseded(&self, notification: &PendingNotification, seq: u64) -> bool {
        match notification.key_path() {
            None => self.inner.commit_seq.get() > seq,
            Some(path) => self
                .inner
                .path_versions
                .borrow()
                .get(path)
                .is_some_and(|&version| version > seq),
        }
    }

    fn step_logging(&self) -> bool {
        self.inner.log_dispatches && self.inner.mode.get().is_verbose()
    }

    fn outcome(&self, reason: DispatchReason, changes: ChangeSet, conflicts: Vec<KeyPath>) -> DispatchOutcome {
        DispatchOutcome {
            committed: false,
            reason,
            state: self.get_state(),
            changes,
            conflicts,
        }
    }

    fn apply_command(&self, command: Command) -> DispatchOutcome {
        match command {
            Command::SetMode(mode) => {
                self.inner.mode.set(mode);
                info!(mode = %mode, "Diagnostic mode set");
            }
            Command::LockKeyPaths(paths) => {
                let report = self.inner.locks.borrow_mut().lock_paths(&paths);
                info!(locked = ?report.changed, already_locked = ?report.unchanged, "Key paths locked");
            }
            Command::UnlockKeyPaths(paths) => {
                let report = self.inner.locks.borrow_mut().unlock_paths(&paths);
                info!(unlocked = ?report.changed, not_locked = ?report.unchanged, "Key paths unlocked");
            }
            Command::LockState => {
                self.inner.locks.borrow_mut().lock_state();
                info!("State locked");
            }
            Command::UnlockState => {
                self.inner.locks.borrow_mut().unlock_state();
                info!("State unlocked");
            }
        }
        self.inner.metrics.record_command();
        self.outcome(DispatchReason::Control, ChangeSet::new(), Vec::new())
    }
}

impl<A> Store<A>
where
    A: Default + Serialize,
{
    /// Register slice reducers and rebuild the state from their initial
    /// values (each reducer called with no slice and `A::default()`).
    ///
    /// Replaces any previous reducers; prior state is discarded.
    pub fn combine_reducers<I, S>(&self, slices: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = (S, BoxedReducer<A>)>,
        S: Into<String>,
    {
        if self.is_reducing() {
            warn!("combine_reducers called from a reducer, rejected");
            return Err(StoreError::ReentrantDispatch);
        }

        let slices: BTreeMap<String, BoxedReducer<A>> =
            slices.into_iter().map(|(name, reducer)| (name.into(), reducer)).collect();
        let registry = ReducerRegistry::new(slices);
        let initial = {
            let _reducing = PhaseGuard::enter(&self.inner.phase, Phase::Reducing);
            registry.initial_state(&A::default())
        };

        info!(slices = ?registry.slice_names().collect::<Vec<_>>(), "Reducers combined");
        *self.inner.reducers.borrow_mut() = registry;
        *self.inner.state.borrow_mut() = initial;
        self.record(ChangeType::Init, None, None, None);
        Ok(())
    }

    /// Run an action or control command through the dispatch pipeline.
    pub fn dispatch(&self, dispatch: impl Into<Dispatch<A>>) -> DispatchOutcome {
        self.inner.metrics.record_dispatch();
        let dispatch = dispatch.into();

        if self.is_reducing() {
            self.inner.metrics.record_rejected_reentrant();
            warn!(reason = %DispatchReason::Reentrant, "Dispatch from inside a reducer rejected");
            self.record_skipped(SkipReason::Reentrant, dispatch.to_json().ok(), Vec::new());
            return self.outcome(DispatchReason::Reentrant, ChangeSet::new(), Vec::new());
        }

        match dispatch {
            Dispatch::Command(command) => self.apply_command(command),
            Dispatch::Action(action) => self.apply_action(action),
        }
    }

    /// Shorthand for dispatching an unscoped domain action.
    pub fn dispatch_action(&self, payload: A) -> DispatchOutcome {
        self.dispatch(Action::new(payload))
    }

    fn apply_action(&self, action: Action<A>) -> DispatchOutcome {
        let step_logging = self.step_logging();

        if self.is_state_locked() {
            self.inner.metrics.record_rejected_locked();
            warn!(reason = %DispatchReason::Locked, "State is locked, action rejected");
            self.record_skipped(SkipReason::Locked, action.to_json().ok(), Vec::new());
            return self.outcome(DispatchReason::Locked, ChangeSet::new(), Vec::new());
        }

        let before = self.inner.state.borrow().clone();
        let registry = self.inner.reducers.borrow().clone();
        let after = {
            let _reducing = PhaseGuard::enter(&self.inner.phase, Phase::Reducing);
            registry.reduce(&before, &action.payload)
        };

        let changes = changed_paths(&before, &after, &action.diff_scope());
        if step_logging {
            debug!(changed = ?changes.keys().map(ToString::to_string).collect::<Vec<_>>(), "Diff computed");
        }

        let (rejected, conflicts) = {
            let locks = self.inner.locks.borrow();
            if action.keypaths_to_change.is_some() && !locks.locked_paths().is_empty() {
                let mut checked = changed_paths(&before, &after, &DiffScope::Paths(locks.locked_paths().clone()));
                checked.extend(changes.iter().map(|(path, record)| (path.clone(), record.clone())));
                (locks.rejects(&checked), locks.conflicts(&checked))
            } else {
                (locks.rejects(&changes), locks.conflicts(&changes))
            }
        };
        if rejected {
            self.inner.metrics.record_rejected_locked_paths();
            warn!(
                reason = %DispatchReason::LockedPaths,
                conflicts = ?conflicts.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "Action touches locked key paths, rejected"
            );
            self.record_skipped(SkipReason::LockedPaths, action.to_json().ok(), conflicts.clone());
            return self.outcome(DispatchReason::LockedPaths, changes, conflicts);
        }

        if changes.is_empty() {
            self.inner.metrics.record_no_op();
            if step_logging {
                debug!(reason = %DispatchReason::NoChange, "Reducers produced an identical state");
            }
            self.record_skipped(SkipReason::NoChange, action.to_json().ok(), Vec::new());
            return self.outcome(DispatchReason::NoChange, changes, Vec::new());
        }

        self.commit(&action, after, changes)
    }

    fn commit(&self, action: &Action<A>, committed: Value, changes: ChangeSet) -> DispatchOutcome {
        let outermost = self.inner.phase.get() != Phase::Notifying;
        if outermost {
            self.inner.path_versions.borrow_mut().clear();
        }
        let seq = self.inner.commit_seq.get() + 1;
        self.inner.commit_seq.set(seq);
        *self.inner.state.borrow_mut() = deep_clone(&committed);

        let action_json = match action.to_json() {
            Ok(json) => Some(json),
            Err(err) => {
                warn!(error = %err, "Action could not be serialized for history");
                None
            }
        };
        self.record(ChangeType::State, action_json, None, Some(&changes));
        self.inner.metrics.record_commit();
        info!(commit = seq, changed = changes.len(), "State committed");

        if !outermost {
            let mut versions = self.inner.path_versions.borrow_mut();
            for path in changes.keys() {
                versions.insert(path.clone(), seq);
            }
        }

        let pending = self.inner.listeners.borrow().snapshot(&changes);
        {
            let _notifying = PhaseGuard::enter(&self.inner.phase, Phase::Notifying);
            for notification in &pending {
                if self.is_superseded(notification, seq) {
                    debug!(listener = %notification.id(), commit = seq, "Newer commit already delivered, skipped");
                    self.inner.metrics.record_notification(false);
                    continue;
                }
                let delivered = notification.deliver(&committed);
                self.inner.metrics.record_notification(delivered);
            }
        }
        if outermost {
            self.inner.path_versions.borrow_mut().clear();
        }

        DispatchOutcome {
            committed: true,
            reason: DispatchReason::None,
            state: committed,
            changes,
            conflicts: Vec::new(),
        }
    }
}

impl<A> Store<A>
where
    A: Default + Serialize + DeserializeOwned,
{
    /// Parse a loosely-typed action object and dispatch it.
    pub fn dispatch_json(&self, value: Value) -> Result<DispatchOutcome, StoreError> {
        let dispatch = Dispatch::from_json(value)?;
        Ok(self.dispatch(dispatch))
    }
}

impl<A> StoreApi<A> for Store<A>
where
    A: Default + Serialize,
{
    type Subscription = Subscription<A>;

    fn combine_reducers(&self, slices: BTreeMap<String, BoxedReducer<A>>) -> Result<(), StoreError> {
        Store::combine_reducers(self, slices)
    }

    fn dispatch(&self, dispatch: Dispatch<A>) -> DispatchOutcome {
        Store::dispatch(self, dispatch)
    }

    fn get_state(&self) -> Value {
        Store::get_state(self)
    }

    fn subscribe(&self, listener: Box<dyn FnMut(&Value)>) -> Subscription<A> {
        Store::subscribe(self, listener)
    }

    fn subscribe_to(&self, path: KeyPath, listener: Box<dyn FnMut(&ChangeRecord)>) -> Subscription<A> {
        Store::subscribe_to(self, path, listener)
    }
}

/// Capability to remove one registered listener.
///
/// Dropping the handle leaves the listener registered for the lifetime of
/// the store; call [`Subscription::unsubscribe`] to remove it.
pub struct Subscription<A> {
    store: Weak<Inner<A>>,
    id: ListenerId,
    kind: ListenerKind,
}

impl<A> Subscription<A> {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn kind(&self) -> &ListenerKind {
        &self.kind
    }

    /// True while the listener is registered and the store is alive.
    pub fn is_active(&self) -> bool {
        self.store.upgrade().is_some_and(|inner| {
            let listeners = inner.listeners.borrow();
            listeners.contains(self.id)
        })
    }

    /// Remove the listener and record a `DEL_LISTENER` history entry.
    ///
    /// Returns false if it was already removed or the store is gone.
    pub fn unsubscribe(self) -> bool {
        match self.store.upgrade() {
            Some(inner) => Store { inner }.remove_listener(self.id),
            None => false,
        }
    }

    /// Give up the handle, keeping the listener registered.
    pub fn detach(self) {}
}

impl<A> fmt::Debug for Subscription<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}
