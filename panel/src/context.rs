//! Per-call mutable state threaded through the interceptor chain.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::error::PanelError;
use crate::method::RestMethod;
use crate::request::Params;
use crate::response::PanelResult;

/// Raw HTTP response as received from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// State of a single call.
///
/// The context owns a private copy of the descriptor's parameters, the
/// headers to send, and the outcome slots the chain fills in: the raw
/// response, the typed result, or an error. It lives for exactly one call.
///
/// Interceptors that short-circuit the chain (by not calling
/// [`Next::proceed`](crate::interceptor::Next::proceed)) must leave either a
/// response, a result, or an error behind. A context with none of the three
/// after the chain ends fails the call with
/// [`PanelError::IncompleteChain`].
pub struct RequestContext {
    endpoint: String,
    method: RestMethod,
    params: Params,
    headers: BTreeMap<String, String>,
    response: Option<RawResponse>,
    result: Option<Box<dyn Any + Send>>,
    error: Option<PanelError>,
    cancel: CancellationToken,
    attempts: u32,
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("endpoint", &self.endpoint)
            .field("method", &self.method)
            .field("params", &self.params.keys().collect::<Vec<_>>())
            .field("headers", &self.headers)
            .field("response", &self.response)
            .field("has_result", &self.result.is_some())
            .field("error", &self.error)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("attempts", &self.attempts)
            .finish()
    }
}

impl RequestContext {
    pub fn new(
        endpoint: impl Into<String>,
        method: RestMethod,
        params: Params,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            params,
            headers: BTreeMap::new(),
            response: None,
            result: None,
            error: None,
            cancel,
            attempts: 0,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn method(&self) -> RestMethod {
        self.method
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Mutable access to this call's parameters.
    ///
    /// Changes here never reach the descriptor.
    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Value of a header, matching the name case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Sets a header for this call, replacing any previous value under a
    /// case-insensitively equal name.
    pub fn insert_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers
            .retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    pub fn response(&self) -> Option<&RawResponse> {
        self.response.as_ref()
    }

    pub fn set_response(&mut self, response: RawResponse) {
        self.response = Some(response);
    }

    pub fn error(&self) -> Option<&PanelError> {
        self.error.as_ref()
    }

    /// Removes and returns the recorded error.
    pub fn take_error(&mut self) -> Option<PanelError> {
        self.error.take()
    }

    /// Records a failure, replacing any earlier error.
    pub fn fail(&mut self, error: PanelError) {
        self.error = Some(error);
    }

    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    /// Stores the typed result of the call.
    ///
    /// `T` must be the descriptor's output type; a mismatch surfaces as
    /// [`PanelError::ResultTypeMismatch`] when the client unwraps it.
    pub fn set_result<T: Send + 'static>(&mut self, result: PanelResult<T>) {
        self.result = Some(Box::new(result));
    }

    /// Replaces a recorded error with a success result.
    ///
    /// This is the only way an interceptor may absorb an error.
    pub fn recover<T: Send + 'static>(&mut self, result: PanelResult<T>) {
        self.error = None;
        self.set_result(result);
    }

    pub(crate) fn take_result(&mut self) -> Option<Box<dyn Any + Send>> {
        self.result.take()
    }

    pub(crate) fn take_response(&mut self) -> Option<RawResponse> {
        self.response.take()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancels the call; honored at the next chain hop or retry boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Number of transport attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub(crate) fn record_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }
}
