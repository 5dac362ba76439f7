//! Error types for the dashboard API client.
//!
//! # Design
//! Every invocation fails with exactly one `ApiError` kind, whatever the
//! cause and whichever calling convention was used:
//!
//! - `Construction`: the request could not be built (template failure, body
//!   serialization). Raised before any I/O and never retried.
//! - `Network`: the transport failed or the timeout elapsed.
//! - `RequestFailed`: the backend answered with a non-2xx status.
//! - `Decode`: a 2xx body was not valid JSON for the expected type.
//!
//! The client does not interpret statuses (401 vs 404 etc.); callers branch on
//! `status()` themselves.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Boxed source error carried by `TransportError`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by an endpoint invocation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be constructed; no network I/O happened.
    #[error("failed to construct request: {0}")]
    Construction(String),

    /// Transport-level failure: DNS, refused connection, reset, or timeout.
    #[error(transparent)]
    Network(#[from] TransportError),

    /// The backend returned a status outside `[200, 300)`.
    #[error("request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: ErrorBody },

    /// A successful response carried a body that could not be decoded.
    #[error("failed to decode response body (status {status})")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

/// Coarse classification of an `ApiError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Construction,
    Network,
    RequestFailed,
    Decode,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Construction(_) => ErrorKind::Construction,
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::RequestFailed { .. } => ErrorKind::RequestFailed,
            ApiError::Decode { .. } => ErrorKind::Decode,
        }
    }

    /// The HTTP status, when the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RequestFailed { status, .. } | ApiError::Decode { status, .. } => {
                Some(*status)
            }
            ApiError::Construction(_) | ApiError::Network(_) => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Network(e) if e.kind() == NetworkErrorKind::Timeout)
    }

    /// Only transport failures are worth retrying; a decode failure means the
    /// request already succeeded server-side.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

/// Body of a non-2xx response.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    Empty,
    Json(Value),
    Text(String),
}

impl ErrorBody {
    /// Parse a raw body, keeping it as text when it is not JSON.
    pub fn from_raw(raw: String) -> Self {
        if raw.trim().is_empty() {
            return ErrorBody::Empty;
        }
        match serde_json::from_str(&raw) {
            Ok(value) => ErrorBody::Json(value),
            Err(_) => ErrorBody::Text(raw),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ErrorBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorBody::Empty => f.write_str("<empty body>"),
            ErrorBody::Json(value) => write!(f, "{value}"),
            ErrorBody::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// No response within the configured timeout.
    Timeout,
    /// The connection could not be established.
    Connect,
    Other,
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkErrorKind::Timeout => f.write_str("timeout"),
            NetworkErrorKind::Connect => f.write_str("connect"),
            NetworkErrorKind::Other => f.write_str("transport"),
        }
    }
}

/// Failure reported by a `Transport`.
#[derive(Debug, Error)]
#[error("network error ({kind}): {source}")]
pub struct TransportError {
    kind: NetworkErrorKind,
    #[source]
    source: BoxError,
}

impl TransportError {
    pub fn new(kind: NetworkErrorKind, source: impl Into<BoxError>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    pub fn timeout(source: impl Into<BoxError>) -> Self {
        Self::new(NetworkErrorKind::Timeout, source)
    }

    pub fn kind(&self) -> NetworkErrorKind {
        self.kind
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            NetworkErrorKind::Timeout
        } else if err.is_connect() {
            NetworkErrorKind::Connect
        } else {
            NetworkErrorKind::Other
        };
        Self::new(kind, err)
    }
}

/// Errors raised while building an `ApiClient`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("failed to build http transport: {0}")]
    Transport(#[source] reqwest::Error),
}
