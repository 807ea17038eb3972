//! Tracing interceptor.

use std::time::Instant;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use super::{Interceptor, Next};
use crate::context::RequestContext;

/// Emits one event when a call enters the chain and one when it leaves.
///
/// Runs at the lowest priority, so it wraps every other interceptor and
/// reports the final outcome of the call.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInterceptor;

impl LoggingInterceptor {
    pub fn new() -> Self {
        Self
    }
}

impl Interceptor for LoggingInterceptor {
    fn intercept<'a>(&'a self, ctx: &'a mut RequestContext, next: Next<'a>) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let started = Instant::now();
            debug!(
                endpoint = ctx.endpoint(),
                method = %ctx.method(),
                params = ctx.params().len(),
                "Dispatching panel request"
            );

            next.proceed(ctx).await;

            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            match ctx.error() {
                Some(error) => warn!(
                    endpoint = ctx.endpoint(),
                    attempts = ctx.attempts(),
                    elapsed_ms,
                    error = %error,
                    "Panel request failed"
                ),
                None => debug!(
                    endpoint = ctx.endpoint(),
                    attempts = ctx.attempts(),
                    status = ctx.response().map(|r| r.status),
                    elapsed_ms,
                    "Panel request completed"
                ),
            }
        })
    }

    fn priority(&self) -> i32 {
        i32::MIN
    }
}
