//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - API for external callers
//! - Reducers - state transition functions supplied by callers

pub mod inbound;
pub mod reducer;

pub use inbound::{DispatchOutcome, DispatchReason, StoreApi};
pub use reducer::{fold_reducers, reducer, BoxedReducer, FoldedReducer, Reducer};
