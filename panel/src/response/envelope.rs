//! The result envelope returned to callers, and the `{status, msg}` wire
//! envelope most panel endpoints wrap their payloads in.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Uniform outcome of a panel call.
///
/// Construction always succeeds and the value is never mutated afterwards;
/// it only carries data back to the caller.
///
/// ## Examples
///
/// ```rust
/// use panel::PanelResult;
///
/// let result = PanelResult::success("ok", 42);
/// assert!(result.is_success());
/// assert_eq!(result.message(), "ok");
/// assert_eq!(result.data(), Some(&42));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelResult<T> {
    success: bool,
    message: String,
    data: Option<T>,
}

impl<T> PanelResult<T> {
    /// Creates a successful result carrying `data`.
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Creates a failed result without data.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// Creates a result from its raw parts.
    pub fn new(success: bool, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success,
            message: message.into(),
            data,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn is_failed(&self) -> bool {
        !self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Consumes the result and returns its data.
    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// Transforms the data while keeping the flag and message.
    pub fn map<U, F>(self, f: F) -> PanelResult<U>
    where
        F: FnOnce(T) -> U,
    {
        PanelResult {
            success: self.success,
            message: self.message,
            data: self.data.map(f),
        }
    }
}

/// The optional `{status, msg}` wrapper read from a response body.
///
/// A body that is not a JSON object yields an empty envelope, which the
/// executor treats like a missing `status` field: implicit success on 2xx.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Envelope {
    pub status: Option<bool>,
    pub message: Option<String>,
}

impl Envelope {
    pub fn read(body: &str) -> Self {
        let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
            return Self::default();
        };

        let status = map.get("status").and_then(|v| match v {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            _ => None,
        });
        let message = map.get("msg").and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        });

        Self { status, message }
    }

    /// Returns `true` when the body explicitly reports failure.
    pub fn is_rejected(&self) -> bool {
        self.status == Some(false)
    }
}
