//! The terminal step of every call: bounded retry around the transport.
//!
//! This module provides the [`Executor`], which builds the wire request
//! from a [`RequestContext`], sends it through a [`Transport`], classifies
//! each outcome and sleeps between retryable attempts.

use std::sync::Arc;

use reqwest::StatusCode;
use tracing::{debug, warn, Span};
use url::Url;

use crate::config::PanelConfig;
use crate::context::{RawResponse, RequestContext};
use crate::error::{ConfigError, PanelError};
use crate::request::PanelRequest;
use crate::response::{Envelope, PanelResult};
use crate::transport::{Transport, WireRequest};

/// Classified outcome of one attempt.
#[derive(Debug)]
pub(crate) enum Outcome<T> {
    Success(PanelResult<T>),
    Retryable(PanelError),
    Fatal(PanelError),
}

impl<T> Outcome<T> {
    pub(crate) fn into_result(self) -> Result<PanelResult<T>, PanelError> {
        match self {
            Self::Success(result) => Ok(result),
            Self::Retryable(error) | Self::Fatal(error) => Err(error),
        }
    }
}

/// Classifies a response the panel actually sent.
///
/// - 401 and 403 are authentication failures and never retried.
/// - 2xx with `status: false` is an [`PanelError::ApiResponse`], retried
///   only if the 2xx code itself is configured retryable.
/// - Any other 2xx goes to the descriptor's parser; a parse failure is
///   fatal. A body without a `status` field is implicit success.
/// - Every other status is an [`PanelError::ApiResponse`], retryable when
///   listed in the config.
pub(crate) fn classify<R>(
    request: &R,
    response: &RawResponse,
    config: &PanelConfig,
) -> Outcome<R::Output>
where
    R: PanelRequest + ?Sized,
{
    let status = response.status;
    let envelope = Envelope::read(&response.body);

    if status == 401 || status == 403 {
        return Outcome::Fatal(PanelError::Authentication {
            status,
            message: envelope
                .message
                .unwrap_or_else(|| response.body.clone()),
            body: response.body.clone(),
        });
    }

    if response.is_success() && !envelope.is_rejected() {
        return match request.parse(&response.body) {
            Ok(data) => Outcome::Success(PanelResult::success(
                envelope.message.unwrap_or_default(),
                data,
            )),
            Err(error) => Outcome::Fatal(error.into()),
        };
    }

    let message = envelope.message.unwrap_or_else(|| {
        StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("Unknown status")
            .to_string()
    });
    let error = PanelError::ApiResponse {
        status,
        message,
        body: response.body.clone(),
    };

    if config.is_retryable_status(status) {
        Outcome::Retryable(error)
    } else {
        Outcome::Fatal(error)
    }
}

/// Sends requests with bounded, fixed-interval retry.
///
/// One executor is shared by every call of a client. Attempts for a single
/// call are strictly sequential and never exceed `retry_count + 1`.
#[derive(Debug)]
pub struct Executor<T: Transport> {
    transport: T,
    config: Arc<PanelConfig>,
    base_url: Url,
}

impl<T: Transport> Executor<T> {
    /// Creates an executor over `transport`.
    ///
    /// ## Errors
    ///
    /// Returns an error if the configured base URL is unusable.
    pub fn new(transport: T, config: Arc<PanelConfig>) -> Result<Self, ConfigError> {
        let base_url = config.parsed_base_url()?;
        Ok(Self {
            transport,
            config,
            base_url,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs the retry loop and stores the outcome on `ctx`.
    ///
    /// On success the context holds the last raw response and the typed
    /// result; on failure it holds the last classified error.
    pub async fn execute<R>(&self, ctx: &mut RequestContext, request: &R)
    where
        R: PanelRequest + ?Sized,
    {
        match self.run(ctx, request).await {
            Ok(result) => ctx.set_result(result),
            Err(error) => ctx.fail(error),
        }
    }

    async fn run<R>(
        &self,
        ctx: &mut RequestContext,
        request: &R,
    ) -> Result<PanelResult<R::Output>, PanelError>
    where
        R: PanelRequest + ?Sized,
    {
        let wire = WireRequest::build(&self.config, &self.base_url, ctx)?;
        Span::current().record("http.url", wire.url.as_str());

        let max_attempts = self.config.max_attempts();
        let interval = self.config.retry_interval();
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            if ctx.is_cancelled() {
                return Err(PanelError::Cancelled);
            }

            ctx.record_attempt();
            Span::current().record("panel.attempts", attempt);

            let outcome = match self.transport.send(&wire).await {
                Ok(response) => {
                    Span::current().record("http.status_code", response.status);
                    let outcome = classify(request, &response, &self.config);
                    ctx.set_response(response);
                    outcome
                }
                Err(error) if error.is_transient() => Outcome::Retryable(error.into()),
                Err(error) => Outcome::Fatal(error.into()),
            };

            let error = match outcome {
                Outcome::Success(result) => {
                    debug!(attempt, "Panel request succeeded");
                    return Ok(result);
                }
                Outcome::Fatal(error) => return Err(error),
                Outcome::Retryable(error) => error,
            };

            if attempt < max_attempts {
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = self.config.retry_interval_ms,
                    error = %error,
                    "Retryable panel failure, retrying"
                );

                let cancel = ctx.cancellation_token().clone();
                tokio::select! {
                    () = cancel.cancelled() => return Err(PanelError::Cancelled),
                    () = tokio::time::sleep(interval) => {}
                }
            }

            last_error = Some(error);
        }

        // max_attempts is at least 1, so the loop always records an error
        Err(last_error.unwrap_or(PanelError::Cancelled))
    }
}
