//! The request descriptor seam.
//!
//! The engine knows nothing about individual panel endpoints. Each call is
//! described by a [`PanelRequest`]: where it goes, how it is sent, which
//! parameters it carries, and how its body becomes typed data. The
//! descriptor is only ever read; the engine copies its parameters into a
//! private [`RequestContext`](crate::RequestContext) per call, so one
//! descriptor can back any number of concurrent calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ParseError;
use crate::method::RestMethod;

/// Request parameters. Keys are unique and iterate in sorted order.
pub type Params = BTreeMap<String, String>;

/// A single panel API call.
///
/// ## Examples
///
/// ```rust
/// use panel::{PanelRequest, ParseError, RestMethod};
///
/// struct SystemTotal;
///
/// impl PanelRequest for SystemTotal {
///     type Output = serde_json::Value;
///
///     fn endpoint(&self) -> &str {
///         "system?action=GetSystemTotal"
///     }
///
///     fn method(&self) -> RestMethod {
///         RestMethod::Post
///     }
///
///     fn parse(&self, body: &str) -> Result<Self::Output, ParseError> {
///         Ok(serde_json::from_str(body)?)
///     }
/// }
/// ```
pub trait PanelRequest: Send + Sync {
    /// Typed data produced by [`parse`](Self::parse).
    type Output: Send + 'static;

    /// Path relative to the configured base URL.
    fn endpoint(&self) -> &str;

    fn method(&self) -> RestMethod;

    /// Parameters sent with the call, before signing.
    fn params(&self) -> Params {
        Params::new()
    }

    /// Converts a successful response body into typed data.
    fn parse(&self, body: &str) -> Result<Self::Output, ParseError>;
}

impl<R: PanelRequest + ?Sized> PanelRequest for Arc<R> {
    type Output = R::Output;

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }

    fn method(&self) -> RestMethod {
        (**self).method()
    }

    fn params(&self) -> Params {
        (**self).params()
    }

    fn parse(&self, body: &str) -> Result<Self::Output, ParseError> {
        (**self).parse(body)
    }
}
