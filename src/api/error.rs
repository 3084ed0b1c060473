//! API error types for the ZenTao client.

use thiserror::Error;

/// Errors that can occur when interacting with the ZenTao API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The verb and path do not match any known module/function pair.
    ///
    /// Raised before any network call is made.
    #[error("No ZenTao module/function mapping for {method} {path}")]
    Translation {
        /// The HTTP verb of the rejected request.
        method: String,
        /// The REST-style path of the rejected request.
        path: String,
    },

    /// Authentication failed or the credentials are no longer accepted.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Permission denied - user lacks access to the resource.
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Rate limited by the ZenTao server.
    #[error("Rate limited: please wait before retrying")]
    RateLimited,

    /// ZenTao server error.
    #[error("ZenTao server error: {0}")]
    ServerError(String),

    /// Any other non-success status.
    #[error("Unexpected HTTP {status}: {body}")]
    UnexpectedStatus {
        /// The numeric status code.
        status: u16,
        /// The raw response body.
        body: String,
    },

    /// Network or HTTP transport error, including timeouts.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request body could not be serialized.
    #[error("Failed to encode request body: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Invalid base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid response from the API.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// The operation needs credentials that are not configured.
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Keyring error when storing/retrieving the app key.
    #[error("Keyring error: {0}")]
    Keyring(String),
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create an error from an HTTP status code and the response body.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized(body.to_string()),
            403 => ApiError::Forbidden(body.to_string()),
            404 => ApiError::NotFound(body.to_string()),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(format!("HTTP {}: {}", status, body)),
            code => ApiError::UnexpectedStatus {
                status: code,
                body: body.to_string(),
            },
        }
    }

    /// Check whether this error came from the transport layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    /// Check whether this error was raised by the path translator.
    pub fn is_translation(&self) -> bool {
        matches!(self, ApiError::Translation { .. })
    }
}
