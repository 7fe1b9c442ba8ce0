//! Service Layer
//!
//! The store itself and the registries it orchestrates.

pub mod reducers;
pub mod store;
pub mod subscriptions;

pub use crate::ports::{DispatchOutcome, DispatchReason};
pub use reducers::ReducerRegistry;
pub use store::{Store, Subscription};
pub use subscriptions::{ListenerId, PendingNotification, SubscriptionRegistry};
