//! Error types for broker gateway communication.
//!
//! Fetch errors are classified so the panel can decide between freezing the
//! previous view and clearing it.

use thiserror::Error;

/// Errors that can occur when talking to the broker gateway.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Request timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Non-success HTTP status.
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Response body or reason.
        message: String,
    },

    /// The gateway answered with something other than JSON (typically a
    /// login page when the session is not authenticated).
    #[error("non-JSON response (content-type: {content_type})")]
    NotJson {
        /// Content type the gateway reported.
        content_type: String,
    },

    /// JSON parsed but did not match the expected schema.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Body could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Order or close-all request rejected by the gateway.
    #[error("order rejected: {0}")]
    OrderRejected(String),

    /// Request rejected before it was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ApiError {
    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a schema mismatch error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Creates a non-JSON response error.
    pub fn not_json(content_type: impl Into<String>) -> Self {
        Self::NotJson {
            content_type: content_type.into(),
        }
    }

    /// Returns true if the response looks like an unauthenticated session.
    #[must_use]
    pub fn is_unauthenticated(&self) -> bool {
        match self {
            Self::NotJson { .. } => true,
            Self::Api { status_code, .. } => matches!(status_code, 401 | 403),
            _ => false,
        }
    }

    /// Returns true if the error is worth retrying on the next natural trigger.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Api { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }

    /// Returns true if the response arrived but carried no usable rows, so the
    /// dependent list should be cleared rather than frozen.
    #[must_use]
    pub fn clears_view(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, ApiError>;
