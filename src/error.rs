//! Error types for the Second Brain SDK

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, ContentError>;

/// SDK error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// Caller is not logged in (HTTP 401)
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    /// Malformed parameters (HTTP 400)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Referenced item absent (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend-side failure
    #[error("Server error {status}: {message}")]
    ServerFault { status: u16, message: String },

    /// Request never reached the server or the response never arrived
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the configured deadline
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Response body did not match the expected envelope
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ContentError {
    /// The fieldless kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ContentError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            ContentError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            ContentError::NotFound(_) => ErrorKind::NotFound,
            ContentError::ServerFault { .. } => ErrorKind::ServerFault,
            ContentError::Network(_) => ErrorKind::Network,
            ContentError::Timeout(_) => ErrorKind::Timeout,
            ContentError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            ContentError::Config(_) => ErrorKind::Config,
        }
    }

    /// Map a non-success HTTP status and its body to an error.
    ///
    /// The backend reports details as `{"error": "..."}` or `{"message": "..."}`;
    /// those are surfaced when present, otherwise the raw body is used.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = backend_message(body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                body.trim().to_string()
            }
        });

        match status {
            401 => ContentError::Unauthenticated(message),
            400 | 422 => ContentError::InvalidRequest(message),
            404 => ContentError::NotFound(message),
            _ => ContentError::ServerFault { status, message },
        }
    }
}

/// Pull `error` or `message` out of a JSON error body
fn backend_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

impl From<reqwest::Error> for ContentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ContentError::Timeout(err.to_string())
        } else if err.is_decode() {
            ContentError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            ContentError::from_status(status.as_u16(), "")
        } else {
            ContentError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ContentError {
    fn from(err: serde_json::Error) -> Self {
        ContentError::MalformedResponse(err.to_string())
    }
}

/// Error kinds, without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Unauthenticated,
    InvalidRequest,
    NotFound,
    ServerFault,
    Network,
    Timeout,
    MalformedResponse,
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Error recorded by the content cache for display
///
/// Holds the kind and a human-readable detail; this is what a dismissible
/// error banner shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&ContentError> for ErrorDescriptor {
    fn from(err: &ContentError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<ContentError> for ErrorDescriptor {
    fn from(err: ContentError) -> Self {
        Self::from(&err)
    }
}

impl fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
