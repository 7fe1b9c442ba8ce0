//! Tree-walking utilities over the state value model.
//!
//! State is a [`serde_json::Value`]: a closed set of variants (null, bool,
//! number, string, array, object), so cloning, freezing and comparison are
//! total structural functions. Function values cannot be stored in state.

use super::path::KeyPath;
use crate::error::StoreError;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeSet;
use std::ops::Deref;
use std::sync::Arc;

/// An immutable, cheaply shareable snapshot of a value.
///
/// There is no way to obtain mutable access to the wrapped value; use
/// [`Frozen::thaw`] to get an owned, mutable copy.
#[derive(Clone, Debug, PartialEq)]
pub struct Frozen(Arc<Value>);

impl Frozen {
    /// An owned deep copy of the frozen value.
    pub fn thaw(&self) -> Value {
        Value::clone(&self.0)
    }
}

impl Deref for Frozen {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.0
    }
}

impl Serialize for Frozen {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Recursively copy a value. Scalars are copied as-is.
#[inline]
pub fn deep_clone(value: &Value) -> Value {
    value.clone()
}

/// Recursively copy a value into an immutable snapshot.
pub fn deep_freeze(value: &Value) -> Frozen {
    Frozen(Arc::new(deep_clone(value)))
}

/// Structural equality.
///
/// Objects are equal iff they have the same key set and every member is
/// equal; arrays iff they have the same length and are pairwise equal.
/// Numbers compare numerically when either side is a float, so `1` and
/// `1.0` are equal.
pub fn deep_compare(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .all(|(key, value)| right.get(key).is_some_and(|other| deep_compare(value, other)))
        }
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len() && left.iter().zip(right).all(|(x, y)| deep_compare(x, y))
        }
        (Value::Number(x), Value::Number(y)) => {
            x == y
                || ((x.is_f64() || y.is_f64())
                    && matches!((x.as_f64(), y.as_f64()), (Some(p), Some(q)) if p == q))
        }
        _ => a == b,
    }
}

/// Every addressable path at every nesting depth of `value`.
///
/// Scalars (and empty containers) contribute no paths of their own beyond
/// the path that addresses them.
pub fn all_key_paths(value: &Value) -> BTreeSet<KeyPath> {
    let mut paths = BTreeSet::new();
    collect_key_paths(value, &KeyPath::root(), &mut paths);
    paths
}

fn collect_key_paths(value: &Value, prefix: &KeyPath, out: &mut BTreeSet<KeyPath>) {
    match value {
        Value::Object(map) => {
            for (key, member) in map {
                let path = prefix.child(key.as_str());
                collect_key_paths(member, &path, out);
                out.insert(path);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let path = prefix.child(index.to_string());
                collect_key_paths(item, &path, out);
                out.insert(path);
            }
        }
        _ => {}
    }
}

/// Parse an array index segment. Only canonical decimal forms are accepted,
/// so `"03"` never aliases `"3"`.
fn parse_index(segment: &str) -> Option<usize> {
    let index = segment.parse::<usize>().ok()?;
    (index.to_string() == segment).then_some(index)
}

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => parse_index(segment).and_then(|i| items.get(i)),
        _ => None,
    }
}

fn child_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => parse_index(segment).and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

fn not_found(path: &KeyPath) -> StoreError {
    StoreError::PathNotFound {
        path: path.to_string(),
    }
}

/// The value at `path`, or `None` if any segment is absent.
pub fn try_get_at<'a>(value: &'a Value, path: &KeyPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(value, |cursor, segment| child(cursor, segment))
}

/// The value at `path`.
///
/// Fails with [`StoreError::PathNotFound`] when an intermediate or final
/// segment is absent.
pub fn get_at<'a>(value: &'a Value, path: &KeyPath) -> Result<&'a Value, StoreError> {
    try_get_at(value, path).ok_or_else(|| not_found(path))
}

/// Replace the value at `path`, returning the previous value.
///
/// Every parent must exist. A missing final object key is created; an array
/// target must be in range or exactly one past the end (append). Setting the
/// root replaces the whole value.
pub fn set_at(root: &mut Value, path: &KeyPath, new_value: Value) -> Result<Option<Value>, StoreError> {
    let Some((last, parents)) = path.segments().split_last() else {
        return Ok(Some(std::mem::replace(root, new_value)));
    };

    let mut cursor = root;
    for segment in parents {
        cursor = child_mut(cursor, segment).ok_or_else(|| not_found(path))?;
    }

    match cursor {
        Value::Object(map) => Ok(map.insert(last.clone(), new_value)),
        Value::Array(items) => {
            let index = parse_index(last).ok_or_else(|| not_found(path))?;
            if index < items.len() {
                Ok(Some(std::mem::replace(&mut items[index], new_value)))
            } else if index == items.len() {
                items.push(new_value);
                Ok(None)
            } else {
                Err(not_found(path))
            }
        }
        _ => Err(not_found(path)),
    }
}
