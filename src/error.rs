//! Gateway error types

use std::time::Duration;

/// Gateway error types
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    // Input errors, raised before any network call
    #[error("invalid input: {0}")]
    Validation(String),

    // Remote/transport errors
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request to {endpoint} timed out after {}s", .timeout.as_secs_f64())]
    Timeout { endpoint: String, timeout: Duration },

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload decoded, but does not have the shape the endpoint promises.
    #[error("unexpected response shape: {0}")]
    Decode(String),

    #[error("empty response from model")]
    EmptyResponse,

    // Configuration / lifecycle errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("gateway session is not open")]
    NotOpen,

    #[error("gateway session is already open")]
    AlreadyOpen,
}

impl GatewayError {
    /// Whether a failed attempt is worth repeating.
    ///
    /// Only upstream 500s qualify. Validation-shaped rejections (422) and
    /// every other status surface on the first attempt, as do timeouts
    /// and transport failures.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Api { status: 500, .. })
    }

    /// HTTP status carried by the error, if the remote answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Map a transport failure for `endpoint`, sent with `timeout`.
    pub(crate) fn from_transport(err: reqwest::Error, endpoint: &str, timeout: Duration) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout {
                endpoint: endpoint.to_string(),
                timeout,
            }
        } else {
            GatewayError::Network(err.to_string())
        }
    }
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
