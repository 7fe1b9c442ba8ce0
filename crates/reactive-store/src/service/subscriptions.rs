//! Subscription registry
//!
//! Global listeners see every committed state; partial listeners see the
//! change record of one key path. Delivery order for a commit:
//!
//! 1. Partial listeners, by ascending key path, FIFO within a path
//! 2. Global listeners, FIFO
//!
//! Notification runs over a snapshot taken at commit time, so listeners
//! added or removed during delivery do not affect it.

use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use tracing::warn;

use crate::domain::{ChangeRecord, ChangeSet, KeyPath, ListenerCounts, ListenerKind};

/// Identifier of one registered listener instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

type GlobalListener = Rc<RefCell<dyn FnMut(&Value)>>;
type PartialListener = Rc<RefCell<dyn FnMut(&ChangeRecord)>>;

/// One listener call captured at commit time.
pub enum PendingNotification {
    Partial {
        id: ListenerId,
        listener: PartialListener,
        record: ChangeRecord,
    },
    Global {
        id: ListenerId,
        listener: GlobalListener,
    },
}

impl PendingNotification {
    pub fn id(&self) -> ListenerId {
        match self {
            PendingNotification::Partial { id, .. } | PendingNotification::Global { id, .. } => *id,
        }
    }

    /// The watched path, or `None` for a global listener.
    pub fn key_path(&self) -> Option<&KeyPath> {
        match self {
            PendingNotification::Partial { record, .. } => Some(&record.key_path),
            PendingNotification::Global { .. } => None,
        }
    }

    /// Invoke the listener. Returns false if it was skipped because it is
    /// already running further up the call stack.
    pub fn deliver(&self, state: &Value) -> bool {
        match self {
            PendingNotification::Partial { id, listener, record } => match listener.try_borrow_mut() {
                Ok(mut call) => {
                    (&mut *call)(record);
                    true
                }
                Err(_) => {
                    warn!(listener = %id, path = %record.key_path, "Listener already running, skipped");
                    false
                }
            },
            PendingNotification::Global { id, listener } => match listener.try_borrow_mut() {
                Ok(mut call) => {
                    (&mut *call)(state);
                    true
                }
                Err(_) => {
                    warn!(listener = %id, "Listener already running, skipped");
                    false
                }
            },
        }
    }
}

#[derive(Default)]
pub struct SubscriptionRegistry {
    next_id: u64,
    global: Vec<(ListenerId, GlobalListener)>,
    partial: BTreeMap<KeyPath, Vec<(ListenerId, PartialListener)>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }

    pub fn subscribe_global<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&Value) + 'static,
    {
        let id = self.allocate_id();
        let listener: GlobalListener = Rc::new(RefCell::new(listener));
        self.global.push((id, listener));
        id
    }

    pub fn subscribe_partial<F>(&mut self, path: KeyPath, listener: F) -> ListenerId
    where
        F: FnMut(&ChangeRecord) + 'static,
    {
        let id = self.allocate_id();
        let listener: PartialListener = Rc::new(RefCell::new(listener));
        self.partial.entry(path).or_default().push((id, listener));
        id
    }

    /// Remove exactly one listener. Returns what kind it was, or `None` if
    /// it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> Option<ListenerKind> {
        if let Some(position) = self.global.iter().position(|(candidate, _)| *candidate == id) {
            self.global.remove(position);
            return Some(ListenerKind::Global);
        }

        let (path, listeners) = self
            .partial
            .iter_mut()
            .find(|(_, listeners)| listeners.iter().any(|(candidate, _)| *candidate == id))?;
        listeners.retain(|(candidate, _)| *candidate != id);
        let path = path.clone();
        if listeners.is_empty() {
            self.partial.remove(&path);
        }
        Some(ListenerKind::Partial(path))
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.global.iter().any(|(candidate, _)| *candidate == id)
            || self
                .partial
                .values()
                .any(|listeners| listeners.iter().any(|(candidate, _)| *candidate == id))
    }

    /// Listener calls owed for a committed change set, in delivery order.
    pub fn snapshot(&self, changes: &ChangeSet) -> Vec<PendingNotification> {
        let mut pending = Vec::new();
        for (path, listeners) in &self.partial {
            let Some(record) = changes.get(path) else {
                continue;
            };
            pending.extend(listeners.iter().map(|(id, listener)| PendingNotification::Partial {
                id: *id,
                listener: Rc::clone(listener),
                record: record.clone(),
            }));
        }
        pending.extend(self.global.iter().map(|(id, listener)| PendingNotification::Global {
            id: *id,
            listener: Rc::clone(listener),
        }));
        pending
    }

    pub fn counts(&self) -> ListenerCounts {
        ListenerCounts {
            global: self.global.len(),
            partial: self
                .partial
                .iter()
                .map(|(path, listeners)| (path.clone(), listeners.len()))
                .collect(),
        }
    }
}
