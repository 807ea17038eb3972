//! Response parsing errors.

use thiserror::Error;

/// Errors raised while converting a response body into the descriptor's
/// output type.
///
/// A parse failure means the wire format does not match what the descriptor
/// expects; it is never retried.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The body parsed, but a field the descriptor requires is absent.
    #[error("Missing field in response: {field}")]
    MissingField {
        /// Name of the absent field.
        field: String,
    },

    /// Empty response body when content was expected.
    #[error("Empty response body")]
    EmptyBody,

    /// Descriptor-specific parse failure.
    #[error("Unexpected response: {0}")]
    Unexpected(String),
}

impl ParseError {
    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Returns `true` if the body was not syntactically valid JSON.
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, Self::Json(e) if e.is_syntax() || e.is_eof())
    }
}
