//! # Client Configuration
//!
//! Resolves the settings of the shared [`ApiClient`](crate::retrieve::ApiClient).
//! Sources are layered, lowest priority first:
//!
//! 1. Built-in defaults ([`DEFAULT_BASE_URL`], [`DEFAULT_TIMEOUT_SECS`], [`DEFAULT_LOGIN_ROUTE`]).
//! 2. An optional JSON file (`{"base_url": "...", "timeout_secs": "5"}`).
//! 3. Environment variables prefixed with `EDUDATA_` (`EDUDATA_BASE_URL`, ...).

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{ext::*, *};
use thiserror::Error;
use url::Url;

/// Base address of the EduData REST API during local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8081/api";
/// Client-wide request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Route the session-expired handler redirects to.
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

const ENV_PREFIX: &str = "EDUDATA_";
const CONFIG_FILE_NAME: &str = "edudata.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration sources: {0}")]
    Load(String),

    #[error("Invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// Settings for the transport and session layers.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Absolute base address; relative paths are appended to it.
    pub base_url: String,
    /// Applied to every request; expiry surfaces as a network error.
    pub timeout: Duration,
    /// Target handed to the session-expired handler on `401`.
    pub login_route: String,
    /// Transient-failure retries. Zero disables the retry middleware.
    pub max_retries: u32,
    /// Location of the durable session file. `None` means the platform data dir.
    pub session_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            max_retries: 0,
            session_file: None,
        }
    }
}

impl fmt::Display for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ClientConfig
    Base URL: {},
    Timeout: {}s,
    Login route: {},
    Max retries: {},
    Session file: {}
",
            self.base_url,
            self.timeout.as_secs(),
            self.login_route,
            self.max_retries,
            self.session_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<data dir>".to_string()),
        )
    }
}

impl ClientConfig {
    /// Default settings pointed at another base address.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Loads the layered configuration. `file` defaults to `edudata.json` in the
    /// working directory; a missing file is skipped.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let file: String = file
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| CONFIG_FILE_NAME.to_string());

        let config_data: Box<dyn ConfigurationRoot> = DefaultConfigurationBuilder::new()
            .add_json_file(&file.is().optional())
            .add_env_vars_with_prefix(ENV_PREFIX)
            .build()
            .map_err(|e| ConfigError::Load(format!("{:?}", e)))?;

        let mut options: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in config_data.iter(None) {
            options.insert(key.to_string().to_lowercase(), value.to_string());
        }
        Self::from_options(&options)
    }

    /// Applies flat `key -> value` options (keys lower-case, without prefix) over the defaults.
    pub fn from_options(options: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(base_url) = options.get("base_url") {
            cfg.base_url = base_url.trim().to_string();
        }
        if let Some(raw) = options.get("timeout_secs") {
            let secs = parse_value::<u64>("timeout_secs", raw)?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "timeout_secs".to_string(),
                    value: raw.clone(),
                });
            }
            cfg.timeout = Duration::from_secs(secs);
        }
        if let Some(route) = options.get("login_route") {
            cfg.login_route = route.trim().to_string();
        }
        if let Some(raw) = options.get("max_retries") {
            cfg.max_retries = parse_value::<u32>("max_retries", raw)?;
        }
        if let Some(path) = options.get("session_file") {
            if !path.trim().is_empty() {
                cfg.session_file = Some(PathBuf::from(path.trim()));
            }
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks that the base address is an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}
