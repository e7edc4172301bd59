use std::sync::Mutex;

use tracing::{error, warn};

use crate::storage::{KeyValueStore, TOKEN_KEY, USER_KEY};

/// Source of the bearer credential, injected into the transport.
///
/// `token` is read once per outbound request; `evict` runs when the server
/// rejects the credential with `401`.
pub trait CredentialProvider: Send + Sync {
    fn token(&self) -> Option<String>;

    /// Forgets the credential and any cached user profile.
    fn evict(&self);
}

/// Credential kept in a durable [`KeyValueStore`] under [`TOKEN_KEY`].
///
/// Eviction removes both [`TOKEN_KEY`] and [`USER_KEY`].
#[derive(Debug, Clone)]
pub struct StoredCredentials<S> {
    store: S,
}

impl<S: KeyValueStore> StoredCredentials<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: KeyValueStore> CredentialProvider for StoredCredentials<S> {
    fn token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                // An unreadable store is treated as "not logged in".
                warn!(error = %e, "Could not read stored token");
                None
            }
        }
    }

    fn evict(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.store.remove(key) {
                error!(key, error = %e, "Failed to evict session key");
            }
        }
    }
}

/// A fixed, in-process credential (e.g. passed with `--token`).
#[derive(Debug, Default)]
pub struct StaticToken {
    token: Mutex<Option<String>>,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    /// No credential at all; requests go out unauthenticated.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl CredentialProvider for StaticToken {
    fn token(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn evict(&self) {
        *self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_stored_credentials_read_and_evict() {
        let store = MemoryStore::new();
        let creds = StoredCredentials::new(store.clone());
        assert!(creds.token().is_none());

        store.set(TOKEN_KEY, "abc").unwrap();
        store.set(USER_KEY, "{}").unwrap();
        store.set("theme", "dark").unwrap();
        assert_eq!(creds.token().as_deref(), Some("abc"));

        creds.evict();
        assert!(store.get(TOKEN_KEY).unwrap().is_none());
        assert!(store.get(USER_KEY).unwrap().is_none());
        // Unrelated keys survive
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_blank_token_counts_as_absent() {
        let store = MemoryStore::new();
        store.set(TOKEN_KEY, "  ").unwrap();
        assert!(StoredCredentials::new(store).token().is_none());
    }

    #[test]
    fn test_static_token_evicts() {
        let creds = StaticToken::new("fixed");
        assert_eq!(creds.token().as_deref(), Some("fixed"));
        creds.evict();
        assert!(creds.token().is_none());
        assert!(StaticToken::anonymous().token().is_none());
    }
}
