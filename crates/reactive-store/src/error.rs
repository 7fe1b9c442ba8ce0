//! Error types for the reactive store

use thiserror::Error;

/// Errors that can occur when addressing or driving the store.
///
/// Ordinary dispatch rejections (global lock, locked paths, no-op,
/// re-entrant dispatch) are not errors; they are reported through
/// [`DispatchReason`](crate::service::DispatchReason).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A key path addressed a value that does not exist.
    #[error("Key path not found: {path}")]
    PathNotFound { path: String },

    /// A key path string could not be parsed.
    #[error("Invalid key path: {0:?}")]
    InvalidKeyPath(String),

    /// An operation was attempted while reducers were running.
    #[error("Store is reducing: nested dispatch or reducer registration rejected")]
    ReentrantDispatch,

    /// A loosely-typed action object could not be interpreted.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// A value could not be converted to or from JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
