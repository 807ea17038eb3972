//! The network seam.
//!
//! [`Transport`] sends one fully built [`WireRequest`] and returns the raw
//! status and body. It knows nothing about retries, signing or envelopes;
//! the executor owns those. [`ReqwestTransport`] is the production
//! implementation; tests substitute stubs.

mod http;

use std::future::Future;

use url::Url;

use crate::config::PanelConfig;
use crate::context::RequestContext;
use crate::error::{ConfigError, NetworkError};
use crate::method::RestMethod;

pub use crate::context::RawResponse;
pub use http::ReqwestTransport;

/// Content type of form-encoded bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

const CONTENT_TYPE: &str = "Content-Type";

/// A request ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRequest {
    pub method: RestMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl WireRequest {
    /// Builds the wire request for the current state of `ctx`.
    ///
    /// The URL is the base URL joined with the endpoint by exactly one `/`.
    /// GET and DELETE parameters are appended to the query (after any query
    /// the endpoint already carries); POST, PUT and PATCH parameters become
    /// a form body. Config headers come first and context headers override
    /// them.
    ///
    /// ## Errors
    ///
    /// Returns a [`ConfigError`] when the joined URL does not parse or the
    /// parameters cannot be form-encoded.
    pub fn build(
        config: &PanelConfig,
        base_url: &Url,
        ctx: &RequestContext,
    ) -> Result<Self, ConfigError> {
        let joined = format!(
            "{}/{}",
            base_url.as_str().trim_end_matches('/'),
            ctx.endpoint().trim_start_matches('/')
        );
        let mut url = Url::parse(&joined)?;

        let mut headers = Vec::with_capacity(config.headers.len() + ctx.headers().len() + 1);
        for (name, value) in config.headers.iter().chain(ctx.headers()) {
            upsert_header(&mut headers, name, value);
        }

        let method = ctx.method();
        let body = if method.has_body() {
            if !headers.iter().any(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE)) {
                headers.push((CONTENT_TYPE.to_string(), FORM_CONTENT_TYPE.to_string()));
            }
            Some(serde_urlencoded::to_string(ctx.params())?)
        } else {
            if !ctx.params().is_empty() {
                url.query_pairs_mut().extend_pairs(ctx.params());
            }
            None
        };

        Ok(Self {
            method,
            url,
            headers,
            body,
        })
    }
}

/// Sets `name` to `value`, replacing any header whose name matches
/// case-insensitively.
fn upsert_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers.iter_mut().find(|(existing, _)| existing.eq_ignore_ascii_case(name)) {
        Some(slot) => *slot = (name.to_string(), value.to_string()),
        None => headers.push((name.to_string(), value.to_string())),
    }
}

/// Sends a single HTTP request.
///
/// Implementations make exactly one network exchange per call and report
/// any non-2xx status as a normal [`RawResponse`]; only failures to obtain
/// a response at all are errors.
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        request: &WireRequest,
    ) -> impl Future<Output = Result<RawResponse, NetworkError>> + Send;
}
