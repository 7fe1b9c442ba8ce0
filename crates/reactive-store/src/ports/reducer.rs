//! Reducer port
//!
//! A reducer is a pure transition from a slice value and an action to the
//! next slice value. The store owns the slice; the reducer receives an
//! owned clone it may mutate freely. `None` means the slice does not exist
//! yet (initialization).

use serde_json::Value;
use std::rc::Rc;

/// State transition function for one slice of the state.
pub trait Reducer<A> {
    fn reduce(&self, slice: Option<Value>, action: &A) -> Value;
}

impl<A, F> Reducer<A> for F
where
    F: Fn(Option<Value>, &A) -> Value,
{
    fn reduce(&self, slice: Option<Value>, action: &A) -> Value {
        self(slice, action)
    }
}

/// Shared, type-erased reducer as stored by the registry.
pub type BoxedReducer<A> = Rc<dyn Reducer<A>>;

/// Wrap a reducer for registration.
pub fn reducer<A, R>(reducer: R) -> BoxedReducer<A>
where
    R: Reducer<A> + 'static,
{
    Rc::new(reducer)
}

/// Applies a list of reducers in sequence, each seeing the previous
/// reducer's output.
pub struct FoldedReducer<A> {
    steps: Vec<BoxedReducer<A>>,
}

impl<A> Reducer<A> for FoldedReducer<A> {
    fn reduce(&self, slice: Option<Value>, action: &A) -> Value {
        let mut current = slice;
        for step in &self.steps {
            current = Some(step.reduce(current, action));
        }
        current.unwrap_or(Value::Null)
    }
}

/// Build one reducer out of many, applied left to right.
///
/// With no steps the slice passes through unchanged (`null` when absent).
pub fn fold_reducers<A>(steps: Vec<BoxedReducer<A>>) -> FoldedReducer<A> {
    FoldedReducer { steps }
}
