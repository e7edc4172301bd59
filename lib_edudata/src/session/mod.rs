//! # Session Lifecycle
//!
//! Everything around the bearer credential:
//!
//! - [`CredentialProvider`] / [`StoredCredentials`]: what the outbound interceptor reads
//!   and the inbound interceptor evicts.
//! - [`SessionExpiredHandler`]: what happens after a `401` eviction.
//! - [`Session`]: the login flow that writes the credential in the first place.

pub mod credentials;
pub mod expiry;

pub use credentials::*;
pub use expiry::*;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, instrument};

use crate::retrieve::{ApiClient, TransportError};
use crate::storage::{KeyValueStore, StoreError, TOKEN_KEY, USER_KEY};

const LOGIN_PATH: &str = "/auth/login";
const GUEST_PATH: &str = "/auth/guest";
const VALIDATE_PATH: &str = "/auth/validate";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The login endpoint answered 2xx without a `token` field.
    #[error("Login response did not contain a token")]
    MissingToken,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Login, guest access, validation and logout against `/auth/*`.
///
/// A successful login stores the token under [`TOKEN_KEY`] and the rest of the
/// response object under [`USER_KEY`].
pub struct Session<S> {
    client: ApiClient,
    store: S,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(client: ApiClient, store: S) -> Self {
        Self { client, store }
    }

    /// Authenticates with username and password. Returns the stored profile.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Value, SessionError> {
        let response = self
            .client
            .post::<Value, _>(LOGIN_PATH, &LoginRequest { username, password })
            .await?;
        self.store_login(response.data)
    }

    /// Obtains a temporary guest token. Returns the stored profile.
    #[instrument(skip(self))]
    pub async fn login_as_guest(&self) -> Result<Value, SessionError> {
        let response = self
            .client
            .post::<Value, _>(GUEST_PATH, &Map::new())
            .await?;
        self.store_login(response.data)
    }

    /// Asks the server whether the stored token is still valid.
    ///
    /// A rejected token yields `Ok(false)`; by then the interceptor already evicted it.
    #[instrument(skip(self))]
    pub async fn validate(&self) -> Result<bool, SessionError> {
        match self.client.get::<Value>(VALIDATE_PATH).await {
            Ok(_) => Ok(true),
            Err(TransportError::Authentication(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Forgets the session locally.
    pub fn logout(&self) -> Result<(), StoreError> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_KEY)?;
        info!("Session cleared");
        Ok(())
    }

    pub fn is_logged_in(&self) -> Result<bool, StoreError> {
        Ok(self
            .store
            .get(TOKEN_KEY)?
            .is_some_and(|t| !t.trim().is_empty()))
    }

    /// The cached profile, if a login stored one.
    pub fn user(&self) -> Result<Option<Value>, StoreError> {
        match self.store.get(USER_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn store_login(&self, data: Option<Value>) -> Result<Value, SessionError> {
        let mut fields = match data {
            Some(Value::Object(map)) => map,
            _ => return Err(SessionError::MissingToken),
        };
        let token = match fields.remove("token") {
            Some(Value::String(t)) if !t.trim().is_empty() => t,
            _ => return Err(SessionError::MissingToken),
        };
        let profile = Value::Object(fields);

        self.store.set(TOKEN_KEY, &token)?;
        self.store.set(USER_KEY, &profile.to_string())?;
        info!("Session stored");
        Ok(profile)
    }
}
