//! Dispatchable messages: control commands and domain actions.
//!
//! Control commands are interpreted by the store itself and never reach
//! reducers. Domain actions carry a caller-defined payload `A` that only
//! reducers interpret, plus an optional declared set of key paths to change
//! (`KEYPATHS_TO_CHANGE`), which narrows the diff.
//!
//! [`Dispatch::from_json`] accepts the loosely-typed object form, where
//! control keys and domain keys share one JSON object. Control keys are
//! resolved in a fixed order and the first one present wins:
//!
//! 1. `mode`
//! 2. `lockKeyPaths` (alias `lockKeys`)
//! 3. `unlockKeyPaths` (alias `unlockKeys`)
//! 4. `lockState`
//! 5. `unlockState`

use super::diff::DiffScope;
use super::history::DiagnosticMode;
use super::path::KeyPath;
use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

pub const MODE: &str = "mode";
pub const LOCK_KEY_PATHS: &str = "lockKeyPaths";
pub const UNLOCK_KEY_PATHS: &str = "unlockKeyPaths";
pub const LOCK_STATE: &str = "lockState";
pub const UNLOCK_STATE: &str = "unlockState";
pub const KEYPATHS_TO_CHANGE: &str = "KEYPATHS_TO_CHANGE";

const LEGACY_LOCK_KEYS: &str = "lockKeys";
const LEGACY_UNLOCK_KEYS: &str = "unlockKeys";

/// Reserved keys that are never passed to reducers.
pub const CONTROL_KEYS: [&str; 8] = [
    MODE,
    LOCK_KEY_PATHS,
    UNLOCK_KEY_PATHS,
    LOCK_STATE,
    UNLOCK_STATE,
    KEYPATHS_TO_CHANGE,
    LEGACY_LOCK_KEYS,
    LEGACY_UNLOCK_KEYS,
];

/// A command handled by the store without running reducers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Command {
    SetMode(DiagnosticMode),
    LockKeyPaths(Vec<KeyPath>),
    UnlockKeyPaths(Vec<KeyPath>),
    LockState,
    UnlockState,
}

impl Command {
    pub fn lock_key_paths<I: IntoIterator<Item = KeyPath>>(paths: I) -> Self {
        Command::LockKeyPaths(paths.into_iter().collect())
    }

    pub fn unlock_key_paths<I: IntoIterator<Item = KeyPath>>(paths: I) -> Self {
        Command::UnlockKeyPaths(paths.into_iter().collect())
    }
}

/// A domain action with an optional declared change scope.
#[derive(Clone, Debug, PartialEq)]
pub struct Action<A> {
    pub payload: A,
    pub keypaths_to_change: Option<BTreeSet<KeyPath>>,
}

impl<A> Action<A> {
    pub fn new(payload: A) -> Self {
        Self {
            payload,
            keypaths_to_change: None,
        }
    }

    /// Restrict diffing to `paths` (and their ancestors).
    pub fn with_keypaths_to_change<I: IntoIterator<Item = KeyPath>>(mut self, paths: I) -> Self {
        self.keypaths_to_change = Some(paths.into_iter().collect());
        self
    }

    pub fn diff_scope(&self) -> DiffScope {
        match &self.keypaths_to_change {
            Some(paths) => DiffScope::Paths(paths.clone()),
            None => DiffScope::All,
        }
    }
}

impl<A: Serialize> Action<A> {
    /// JSON form recorded in the history log.
    pub fn to_json(&self) -> Result<Value, StoreError> {
        let mut value = serde_json::to_value(&self.payload)?;
        if let (Value::Object(map), Some(paths)) = (&mut value, &self.keypaths_to_change) {
            map.insert(KEYPATHS_TO_CHANGE.to_string(), serde_json::to_value(paths)?);
        }
        Ok(value)
    }
}

/// Anything that can be passed to `dispatch`.
#[derive(Clone, Debug, PartialEq)]
pub enum Dispatch<A> {
    Command(Command),
    Action(Action<A>),
}

impl<A> From<Command> for Dispatch<A> {
    fn from(command: Command) -> Self {
        Dispatch::Command(command)
    }
}

impl<A> From<Action<A>> for Dispatch<A> {
    fn from(action: Action<A>) -> Self {
        Dispatch::Action(action)
    }
}

impl<A: Serialize> Dispatch<A> {
    /// JSON form of either variant.
    pub fn to_json(&self) -> Result<Value, StoreError> {
        match self {
            Dispatch::Command(command) => Ok(serde_json::to_value(command)?),
            Dispatch::Action(action) => action.to_json(),
        }
    }
}

impl<A: DeserializeOwned> Dispatch<A> {
    /// Interpret a loosely-typed action object.
    ///
    /// Control keys are checked in precedence order; the first one present
    /// (for `mode`) or truthy (for the others) decides the command and the
    /// remaining keys are ignored. Without a control command, the object
    /// minus reserved keys is deserialized as the domain payload.
    pub fn from_json(value: Value) -> Result<Self, StoreError> {
        let Value::Object(mut map) = value else {
            return Err(StoreError::InvalidAction("action must be a JSON object".to_string()));
        };

        if let Some(mode) = map.get(MODE) {
            let mode = mode
                .as_str()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DiagnosticMode::ActionOnly);
            return Ok(Dispatch::Command(Command::SetMode(mode)));
        }
        if let Some(paths) = truthy_member(&map, &[LOCK_KEY_PATHS, LEGACY_LOCK_KEYS]) {
            return Ok(Dispatch::Command(Command::LockKeyPaths(parse_key_paths(paths)?)));
        }
        if let Some(paths) = truthy_member(&map, &[UNLOCK_KEY_PATHS, LEGACY_UNLOCK_KEYS]) {
            return Ok(Dispatch::Command(Command::UnlockKeyPaths(parse_key_paths(paths)?)));
        }
        if truthy_member(&map, &[LOCK_STATE]).is_some() {
            return Ok(Dispatch::Command(Command::LockState));
        }
        if truthy_member(&map, &[UNLOCK_STATE]).is_some() {
            return Ok(Dispatch::Command(Command::UnlockState));
        }

        let scope = match map.remove(KEYPATHS_TO_CHANGE) {
            Some(paths) => Some(parse_key_paths(&paths)?.into_iter().collect()),
            None => None,
        };
        for key in CONTROL_KEYS {
            map.remove(key);
        }

        let payload = serde_json::from_value(Value::Object(map))
            .map_err(|e| StoreError::InvalidAction(e.to_string()))?;
        Ok(Dispatch::Action(Action {
            payload,
            keypaths_to_change: scope,
        }))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn truthy_member<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|value| is_truthy(value))
}

/// A single path string or an array of path strings.
fn parse_key_paths(value: &Value) -> Result<Vec<KeyPath>, StoreError> {
    match value {
        Value::String(path) => Ok(vec![KeyPath::parse(path)?]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| StoreError::InvalidAction(format!("key path must be a string, got {item}")))
                    .and_then(KeyPath::parse)
            })
            .collect(),
        other => Err(StoreError::InvalidAction(format!(
            "expected key path or list of key paths, got {other}"
        ))),
    }
}
