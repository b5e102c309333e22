//! Error types for the storefront API client.
//!
//! # Design
//! Failures are split by where they happened so callers can branch on the
//! kind instead of parsing message strings: no response at all
//! (`Transport`), a response with a failing status (`NotFound` / `Http`), or
//! a successful status whose body could not be decoded (`MalformedResponse`).
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the resource does not exist" from "the server rejected the request."

use thiserror::Error;

/// Result type for storefront API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by the transport and the resource accessors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was obtained (DNS, connection refused, timeout, I/O).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server returned 404.
    #[error("{detail}")]
    NotFound { detail: String },

    /// The server returned a non-2xx status other than 404. `detail` is the
    /// server's `detail` message, the raw body, or `API Error: <status>`.
    #[error("{detail}")]
    Http { status: u16, detail: String },

    /// A 2xx response whose body could not be decoded into the expected type.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The request was rejected locally before being sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status carried by this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound { .. } => Some(404),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server-provided message for status failures.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::NotFound { detail } | ApiError::Http { detail, .. } => Some(detail),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}
