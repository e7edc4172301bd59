use serde_json::Value;
use thiserror::Error;

/// Message used when neither the server nor the transport describes a failure.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// Uniform failure shape of every [`ApiClient`](super::ApiClient) call.
///
/// `Display` yields the normalized message; callers never need the status code
/// to report a failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// No response was received (connection refused, DNS failure, timeout).
    #[error("{0}")]
    Network(String),

    /// The server answered `401 Unauthorized`. The stored credential has already
    /// been evicted and the session-expired handler notified.
    #[error("{0}")]
    Authentication(String),

    /// Any other non-2xx answer.
    #[error("{message}")]
    Request { status: u16, message: String },

    /// A 2xx answer whose JSON body does not have the expected shape.
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// The request body could not be serialized to JSON.
    #[error("Failed to serialize request body: {0}")]
    Encode(String),

    /// The relative path could not be joined onto the base address.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to initialise HTTP client: {0}")]
    Setup(String),
}

impl TransportError {
    /// The normalized, operator-facing message.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status of the failed response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Authentication(_) => Some(401),
            TransportError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, TransportError::Authentication(_))
    }
}

/// Picks the failure message in priority order: the body's `message` field, the
/// body's `error` field, the transport description, then [`UNKNOWN_ERROR`].
///
/// Empty strings count as absent.
pub fn normalize_message(body: Option<&Value>, description: Option<&str>) -> String {
    let field = |name: &str| {
        body.and_then(|b| b.get(name))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };

    field("message")
        .or_else(|| field("error"))
        .or_else(|| {
            description
                .filter(|d| !d.trim().is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}
