//! Top-level panel error type.

use super::{ConfigError, NetworkError, ParseError};
use thiserror::Error;

/// Top-level error type for every panel call.
///
/// Retries are invisible to the caller: only the final classified outcome
/// of a call surfaces here. Where the panel answered, the HTTP status code
/// and raw body are kept for diagnosis.
///
/// ## Examples
///
/// ```rust,ignore
/// use panel::PanelError;
///
/// fn handle_error(err: PanelError) {
///     match err {
///         PanelError::Network(e) => eprintln!("Network error: {e}"),
///         PanelError::ApiResponse { status, body, .. } => eprintln!("HTTP {status}: {body}"),
///         PanelError::Closed => eprintln!("client already closed"),
///         other => eprintln!("{other}"),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum PanelError {
    /// Bad configuration or malformed descriptor parameters.
    #[error(transparent)]
    Validation(#[from] ConfigError),

    /// The panel rejected the credential or signature.
    #[error("Authentication failed (HTTP {status}): {message}")]
    Authentication {
        /// HTTP status code returned by the panel.
        status: u16,
        /// The envelope `msg` when present, otherwise the raw body.
        message: String,
        /// Raw response body.
        body: String,
    },

    /// Connection, timeout or I/O failure.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Non-2xx response or an explicit `status: false` payload.
    #[error("Panel returned HTTP {status}: {message}")]
    ApiResponse {
        /// HTTP status code returned by the panel.
        status: u16,
        /// The envelope `msg` when present, otherwise the status reason.
        message: String,
        /// Raw response body.
        body: String,
    },

    /// The response body could not be converted to the expected type.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The call was cancelled mid-chain or mid-retry.
    #[error("Call cancelled")]
    Cancelled,

    /// The caller's deadline elapsed before the call completed.
    #[error("Call timed out after {after_ms}ms")]
    Timeout {
        /// The deadline in milliseconds, measured from submission.
        after_ms: u64,
    },

    /// A call was attempted after the client was closed.
    #[error("Client is closed")]
    Closed,

    /// An interceptor ended the chain without a response, result or error.
    ///
    /// Interceptors that skip `next` must either record a result or an
    /// error on the context; silently swallowing the call is a misuse.
    #[error("Interceptor chain completed without producing a result")]
    IncompleteChain,

    /// An interceptor stored a result of a different type than the
    /// descriptor produces.
    #[error("Interceptor stored a result of the wrong type")]
    ResultTypeMismatch,
}

impl PanelError {
    /// Returns the HTTP status code when the panel produced one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } | Self::ApiResponse { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Returns the raw response body when available.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::ApiResponse { body, .. } | Self::Authentication { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Returns `true` for caller- or deadline-driven terminations.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Timeout { .. })
    }
}
