//! Response format trait and implementations.
//!
//! The [`ResponseFormat`] trait defines how a raw response body becomes the
//! typed data of a [`PanelResult`](super::PanelResult). Formats are plain
//! marker types, so an [`Endpoint`](crate::Endpoint) names its parsing
//! strategy in its type.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ParseError;

/// Trait for response format parsing strategies.
///
/// ## Examples
///
/// ```rust,ignore
/// use panel::response::{ResponseFormat, JsonFormat};
///
/// // The format type encodes both the parsing strategy and output type
/// type SitesResponse = JsonFormat<Vec<Site>>;
/// ```
pub trait ResponseFormat: Send + Sync {
    /// The output type after parsing.
    type Output: Send + 'static;

    /// Parse a response body into the output type.
    fn parse(body: &str) -> Result<Self::Output, ParseError>;
}

/// Deserializes the whole body as JSON.
#[derive(Debug, Clone, Copy)]
pub struct JsonFormat<T>(PhantomData<T>);

impl<T: DeserializeOwned + Send + Sync + 'static> ResponseFormat for JsonFormat<T> {
    type Output = T;

    fn parse(body: &str) -> Result<Self::Output, ParseError> {
        if body.trim().is_empty() {
            return Err(ParseError::EmptyBody);
        }
        Ok(serde_json::from_str(body)?)
    }
}

/// Returns the body unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextFormat;

impl ResponseFormat for PlainTextFormat {
    type Output = String;

    fn parse(body: &str) -> Result<Self::Output, ParseError> {
        Ok(body.to_string())
    }
}

/// Deserializes the `data` member of an enveloped body.
///
/// Endpoints that answer `{"status": true, "msg": "...", "data": {...}}`
/// use this to skip the wrapper. A body without `data` is a
/// [`ParseError::MissingField`].
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeDataFormat<T>(PhantomData<T>);

impl<T: DeserializeOwned + Send + Sync + 'static> ResponseFormat for EnvelopeDataFormat<T> {
    type Output = T;

    fn parse(body: &str) -> Result<Self::Output, ParseError> {
        if body.trim().is_empty() {
            return Err(ParseError::EmptyBody);
        }
        let mut value: Value = serde_json::from_str(body)?;
        let data = value
            .get_mut("data")
            .map(Value::take)
            .ok_or_else(|| ParseError::missing_field("data"))?;
        Ok(serde_json::from_value(data)?)
    }
}
