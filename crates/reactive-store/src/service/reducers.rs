//! Reducer registry: slice name to reducer.
//!
//! The state root is an object with one member per registered slice. Slices
//! are reduced in ascending name order.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::ports::BoxedReducer;

pub struct ReducerRegistry<A> {
    slices: BTreeMap<String, BoxedReducer<A>>,
}

impl<A> Default for ReducerRegistry<A> {
    fn default() -> Self {
        Self {
            slices: BTreeMap::new(),
        }
    }
}

impl<A> Clone for ReducerRegistry<A> {
    fn clone(&self) -> Self {
        Self {
            slices: self.slices.clone(),
        }
    }
}

impl<A> ReducerRegistry<A> {
    pub fn new(slices: BTreeMap<String, BoxedReducer<A>>) -> Self {
        Self { slices }
    }

    pub fn slice_names(&self) -> impl Iterator<Item = &str> {
        self.slices.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Initial state: every reducer invoked with no slice and `init`.
    pub fn initial_state(&self, init: &A) -> Value {
        let root: Map<String, Value> = self
            .slices
            .iter()
            .map(|(name, reducer)| (name.clone(), reducer.reduce(None, init)))
            .collect();
        Value::Object(root)
    }

    /// Next state: a clone of `state` with every slice replaced by its
    /// reducer's output. Members without a reducer are carried over.
    pub fn reduce(&self, state: &Value, action: &A) -> Value {
        let mut next = match state {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        for (name, reducer) in &self.slices {
            let slice = next.remove(name);
            next.insert(name.clone(), reducer.reduce(slice, action));
        }
        Value::Object(next)
    }
}
