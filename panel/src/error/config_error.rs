//! Configuration and descriptor validation errors.

use thiserror::Error;

/// Errors in client configuration or in the parameters a descriptor supplies.
///
/// These are surfaced immediately and never retried; they indicate a
/// programmer or deployment error rather than a transient fault.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required configuration field is missing or blank.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The URL parsed but cannot address a panel.
    #[error("Malformed URL '{url}': {reason}")]
    MalformedUrl {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A numeric setting was negative.
    #[error("{field} must not be negative (got {value})")]
    Negative {
        /// The setting name.
        field: &'static str,
        /// The rejected value.
        value: i64,
    },

    /// A setting could not be interpreted.
    #[error("Invalid value for {field}: {value}")]
    InvalidValue {
        /// The setting name.
        field: &'static str,
        /// The rejected raw value.
        value: String,
    },

    /// A configured header name or value is not legal HTTP.
    #[error("Invalid header: {name}")]
    InvalidHeader {
        /// The header name as configured.
        name: String,
    },

    /// A JSON configuration document could not be read.
    #[error("Invalid configuration document: {0}")]
    Document(#[from] serde_json::Error),

    /// Descriptor parameters carry only one half of the signature pair.
    #[error("Parameters define '{present}' without its counterpart; supply both request_time and request_token or neither")]
    PartialSignature {
        /// The signature parameter that was present.
        present: &'static str,
    },

    /// Parameters could not be form-encoded.
    #[error("Parameter encoding failed: {0}")]
    Encoding(#[from] serde_urlencoded::ser::Error),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client construction failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// No tokio runtime was available to host the worker pool.
    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),
}

impl ConfigError {
    /// Creates a missing field error.
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
        }
    }
}
