//! # HTTP Retrieval Utilities
//!
//! This module provides the asynchronous API client shared by every resource
//! controller. It wraps `reqwest` with `reqwest-middleware` so that credential
//! injection and session eviction run on every call, and it turns every failure
//! into one [`TransportError`] shape.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{error, info};

use super::error::{normalize_message, TransportError};
use super::interceptors::{BearerAuth, SessionGuard};
use crate::configs::ClientConfig;
use crate::session::{CredentialProvider, SessionExpiredHandler};

/// A successful API response.
///
/// Failures never reach this type; they are returned as [`TransportError`].
#[derive(Debug)]
pub struct ApiResponse<T> {
    /// The deserialized body. `None` when the server sent an empty or non-JSON body.
    pub data: Option<T>,
    /// The numeric HTTP status code (always 2xx).
    pub status: u16,
    /// The headers returned by the server.
    pub headers: HeaderMap,
}

/// The shared asynchronous HTTP client.
///
/// Bound to one base address with a fixed timeout. Cloning is cheap and clones
/// share the connection pool and interceptors.
#[derive(Clone)]
pub struct ApiClient {
    /// The underlying middleware-enabled client.
    inner: ClientWithMiddleware,
    /// The base address relative paths are appended to, without trailing slash.
    base_url: String,
    /// The client-wide request timeout.
    timeout: Duration,
}

impl ApiClient {
    /// Creates a new `ApiClient` from the resolved configuration.
    ///
    /// # Arguments
    /// * `config` - Base address, timeout, login route and retry settings.
    /// * `credentials` - Source of the bearer token, evicted on `401`.
    /// * `on_expired` - Called with the login route after an eviction.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidUrl`] if the base address is not an absolute
    /// URL and [`TransportError::Setup`] if the HTTP client cannot be built.
    pub fn new(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialProvider>,
        on_expired: Arc<dyn SessionExpiredHandler>,
    ) -> Result<Self, TransportError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;

        // Outermost first: the session guard sees the final response, the bearer
        // stage re-reads the credential on every (re)try.
        let mut builder = ClientBuilder::new(http).with(SessionGuard::new(
            credentials.clone(),
            on_expired,
            config.login_route.clone(),
        ));
        if config.max_retries > 0 {
            let retry_policy =
                ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
            builder = builder.with(RetryTransientMiddleware::new_with_policy(retry_policy));
        }
        let inner = builder.with(BearerAuth::new(credentials)).build();

        Ok(Self {
            inner,
            base_url,
            timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Appends `path` to the base address, keeping the base path (e.g. `/api`).
    pub fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        let full = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&full).map_err(|e| TransportError::InvalidUrl(format!("{}: {}", full, e)))
    }

    /// Performs a generic HTTP request and normalizes the outcome.
    ///
    /// # Arguments
    /// * `method` - The HTTP verb.
    /// * `path` - The path relative to the base address.
    /// * `body` - Optional value sent as the JSON body.
    ///
    /// # Errors
    /// * [`TransportError::Network`] when no response arrives (including timeouts).
    /// * [`TransportError::Authentication`] on `401`, after the session was evicted.
    /// * [`TransportError::Request`] on any other non-2xx status.
    /// * [`TransportError::Decode`] when a 2xx JSON body does not match `T`.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse<T>, TransportError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        // 1. Construct the full absolute URL
        let full_url = self.url_for(path)?;
        let mut req = self.inner.request(method.clone(), full_url.clone());

        // 2. Serialize and attach the JSON body if present
        if let Some(b) = body {
            let json_body =
                serde_json::to_vec(b).map_err(|e| TransportError::Encode(e.to_string()))?;
            req = req.header(CONTENT_TYPE, "application/json").body(json_body);
        }

        // 3. Execute the request through the interceptor chain
        let response = req
            .send()
            .await
            .map_err(|e| self.network_error(&method, &full_url, e))?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(|e| {
            self.network_error(&method, &full_url, reqwest_middleware::Error::Reqwest(e))
        })?;

        // 4. Success: decode the body if it is JSON
        if status.is_success() {
            info!(status = status.as_u16(), %method, url = %full_url, "API response");
            let data = decode_body::<T>(&headers, &bytes)?;
            return Ok(ApiResponse {
                data,
                status: status.as_u16(),
                headers,
            });
        }

        // 5. Failure: normalize the message, classify by status
        let error_body: Option<Value> = serde_json::from_slice(&bytes).ok();
        let description = format!("Request failed with status code {}", status.as_u16());
        let message = normalize_message(error_body.as_ref(), Some(&description));
        error!(status = status.as_u16(), %method, url = %full_url, %message, "API error");

        if status == StatusCode::UNAUTHORIZED {
            Err(TransportError::Authentication(message))
        } else {
            Err(TransportError::Request {
                status: status.as_u16(),
                message,
            })
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<ApiResponse<T>, TransportError> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<ApiResponse<T>, TransportError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<ApiResponse<T>, TransportError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<ApiResponse<T>, TransportError> {
        self.request::<T, ()>(Method::DELETE, path, None).await
    }

    fn network_error(
        &self,
        method: &Method,
        url: &Url,
        err: reqwest_middleware::Error,
    ) -> TransportError {
        let description = match &err {
            reqwest_middleware::Error::Reqwest(e) if e.is_timeout() => {
                format!("timeout of {}ms exceeded", self.timeout.as_millis())
            }
            other => other.to_string(),
        };
        let message = normalize_message(None, Some(&description));
        error!(%method, %url, %message, "API network error");
        TransportError::Network(message)
    }
}

/// Empty and non-JSON bodies decode to `None`.
fn decode_body<T: DeserializeOwned>(
    headers: &HeaderMap,
    bytes: &[u8],
) -> Result<Option<T>, TransportError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.to_ascii_lowercase().contains("json"))
        .unwrap_or(true);
    if !is_json {
        return Ok(None);
    }
    serde_json::from_slice::<T>(bytes)
        .map(Some)
        .map_err(|e| TransportError::Decode(e.to_string()))
}
