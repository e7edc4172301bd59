//! # Durable Key-Value Storage
//!
//! The session credential outlives a single run of the console, so it is kept in a
//! small key-value store. Two keys matter to the rest of the crate:
//!
//! - [`TOKEN_KEY`]: the bearer token written by the login flow.
//! - [`USER_KEY`]: the opaque profile blob returned alongside the token.
//!
//! Both are removed together when the server answers `401 Unauthorized`.

use thiserror::Error;

/// In-memory store used by tests and short-lived sessions.
pub mod memory;
/// JSON-file store that survives process restarts.
pub mod file_store;

pub use file_store::FileStore;
pub use memory::MemoryStore;

/// Key under which the bearer token is persisted.
pub const TOKEN_KEY: &str = "token";
/// Key under which the cached user profile is persisted.
pub const USER_KEY: &str = "user";

/// Errors raised by a [`KeyValueStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but is not a JSON object of strings.
    #[error("Storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// No platform data directory could be determined for the default location.
    #[error("No data directory available for the session file")]
    NoDataDir,
}

/// A string-to-string store with durable semantics.
///
/// Implementations must be cheap to share between the transport interceptors
/// and the login flow, hence `Send + Sync` and `&self` receivers.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}
