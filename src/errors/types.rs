//! Error types shared by the fetch layer and the classifier.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad failure category surfaced to UI code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Session or token invalid or expired.
    Auth,
    /// Connectivity problem or timeout.
    Network,
    /// Backend failure or anything unclassified.
    Server,
    /// Malformed request; the caller must fix its input.
    Validation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Auth => "auth",
            ErrorKind::Network => "network",
            ErrorKind::Server => "server",
            ErrorKind::Validation => "validation",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified API failure.
///
/// The causing error is kept only for logging; equality and serialization
/// ignore it.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status_code: Option<u16>,
    pub retryable: bool,
    #[serde(skip)]
    pub original_error: Option<Arc<dyn StdError + Send + Sync>>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            retryable,
            original_error: None,
        }
    }

    pub fn with_status(mut self, status: Option<u16>) -> Self {
        self.status_code = status;
        self
    }

    pub fn with_original(mut self, error: Arc<dyn StdError + Send + Sync>) -> Self {
        self.original_error = Some(error);
        self
    }
}

impl PartialEq for ApiError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.message == other.message
            && self.status_code == other.status_code
            && self.retryable == other.retryable
    }
}

impl fmt::Debug for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("status_code", &self.status_code)
            .field("retryable", &self.retryable)
            .field("original_error", &self.original_error.as_ref().map(|e| e.to_string()))
            .finish()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)
    }
}

/// Why the backend rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailureReason {
    /// HTTP 401.
    Unauthorized,
    /// HTTP 403.
    Forbidden,
}

impl AuthFailureReason {
    /// Map an HTTP status to a reason; `None` for anything but 401/403.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            401 => Some(Self::Unauthorized),
            403 => Some(Self::Forbidden),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
        }
    }
}

impl fmt::Display for AuthFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when the backend answers 401 or 403.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Authentication failed: {reason} ({status})")]
pub struct AuthenticationError {
    pub reason: AuthFailureReason,
    pub status: u16,
    /// Call site that issued the request, if known.
    pub origin: Option<String>,
}

/// Everything a data-fetching call can fail with.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Auth(#[from] AuthenticationError),

    /// No usable token right now; no request was sent.
    #[error("No authentication token available")]
    MissingToken,

    /// The request never produced a response.
    #[error("Network request failed: {0}")]
    Network(#[source] reqwest::Error),

    /// The request could not be built, e.g. a token that is not a legal
    /// header value. Nothing was sent.
    #[error("Failed to build request: {0}")]
    Request(#[source] reqwest::Error),

    /// A non-auth, non-success status.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode response body: {0}")]
    Decode(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Auth(e) => Some(e.status),
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
