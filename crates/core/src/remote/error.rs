//! Remote storage error types.

use thiserror::Error;

/// Remote storage operation errors.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// No usable storage target is configured.
    #[error("storage target is not configured")]
    MissingStorageTarget,

    /// Remote identifier is not numeric.
    #[error("invalid remote id: {0:?}")]
    InvalidRemoteId(String),

    /// No response: connection failure or timeout.
    #[error("request to image service failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Unexpected HTTP status.
    #[error("image service returned HTTP {status}")]
    HttpStatus {
        /// Status code received.
        status: u16,
    },

    /// The service answered with a non-success status.
    #[error("image service rejected the request (status: {})", status.as_deref().unwrap_or("unknown"))]
    Rejected {
        /// `status` field of the response, if present.
        status: Option<String>,
        /// Raw response body.
        body: String,
    },

    /// The response body could not be understood.
    #[error("malformed response from image service: {0}")]
    Decode(String),

    /// HTTP client could not be built.
    #[error("HTTP client configuration error: {0}")]
    Client(String),
}

impl RemoteError {
    /// Create a rejected error.
    #[must_use]
    pub fn rejected(status: Option<String>, body: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error.
    #[must_use]
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}
