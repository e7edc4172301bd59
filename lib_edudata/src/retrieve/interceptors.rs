//! # Interception Stages
//!
//! Two `reqwest-middleware` stages wrap every request of the shared client:
//!
//! - [`BearerAuth`] (outbound) reads the credential for each request and attaches it
//!   as `Authorization: Bearer <token>`. A missing credential is a valid,
//!   unauthenticated state; the request proceeds without the header.
//! - [`SessionGuard`] (inbound) watches for `401 Unauthorized`. It evicts the stored
//!   credential and profile, then hands the login route to the injected
//!   [`SessionExpiredHandler`]. The response itself is passed through untouched; the
//!   client turns it into [`TransportError::Authentication`](super::TransportError).

use std::sync::Arc;

use async_trait::async_trait;
use http::Extensions;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response, StatusCode};
use reqwest_middleware::{Middleware, Next};
use tracing::{debug, warn};

use crate::session::{CredentialProvider, SessionExpiredHandler};

/// Outbound stage: attaches the bearer credential when one is stored.
pub struct BearerAuth {
    credentials: Arc<dyn CredentialProvider>,
}

impl BearerAuth {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl Middleware for BearerAuth {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let with_token = match self.credentials.token() {
            Some(token) => match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    req.headers_mut().insert(AUTHORIZATION, value);
                    true
                }
                Err(_) => {
                    warn!("Stored token is not a valid header value, sending request without it");
                    false
                }
            },
            None => false,
        };

        debug!(method = %req.method(), url = %req.url(), with_token, "API request");
        next.run(req, extensions).await
    }
}

/// Inbound stage: evicts the session on `401 Unauthorized`.
pub struct SessionGuard {
    credentials: Arc<dyn CredentialProvider>,
    on_expired: Arc<dyn SessionExpiredHandler>,
    login_route: String,
}

impl SessionGuard {
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        on_expired: Arc<dyn SessionExpiredHandler>,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            on_expired,
            login_route: login_route.into(),
        }
    }
}

#[async_trait]
impl Middleware for SessionGuard {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let result = next.run(req, extensions).await;

        if let Ok(response) = &result {
            if response.status() == StatusCode::UNAUTHORIZED {
                warn!(
                    url = %response.url(),
                    login_route = %self.login_route,
                    "Token invalid or expired, evicting session"
                );
                self.credentials.evict();
                self.on_expired.on_session_expired(&self.login_route);
            }
        }

        result
    }
}
