//! Transport-level network errors.

use thiserror::Error;

/// Errors raised by a [`Transport`](crate::transport::Transport) before an
/// HTTP status line was received.
///
/// Connection, timeout and I/O faults are transient and eligible for retry.
/// [`NetworkError::Request`] covers failures that will not improve on a
/// second attempt (malformed request, redirect loops, body decoding).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    /// Failed to establish a connection to the panel.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The connect or read phase exceeded its configured timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The connection broke while writing the request or reading the body.
    #[error("I/O failure: {0}")]
    Io(String),

    /// The request could not be sent for a non-transient reason.
    #[error("HTTP request failed: {0}")]
    Request(String),
}

impl NetworkError {
    /// Returns `true` if a fresh attempt may succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Request(_))
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            Self::Timeout(message)
        } else if err.is_connect() {
            Self::Connect(message)
        } else if err.is_body() || err.is_request() {
            Self::Io(message)
        } else {
            Self::Request(message)
        }
    }
}
