//! Header injection interceptor.

use std::collections::BTreeMap;

use futures::future::BoxFuture;

use super::{Interceptor, Next};
use crate::context::RequestContext;

/// Adds a fixed set of headers to every call.
///
/// Headers already set on the context by an earlier interceptor are left
/// alone unless [`overwrite`](Self::overwrite) is enabled.
#[derive(Debug, Clone, Default)]
pub struct HeaderInterceptor {
    headers: BTreeMap<String, String>,
    overwrite: bool,
    priority: i32,
}

impl HeaderInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Replace headers that are already present.
    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl Interceptor for HeaderInterceptor {
    fn intercept<'a>(&'a self, ctx: &'a mut RequestContext, next: Next<'a>) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            for (name, value) in &self.headers {
                if self.overwrite || ctx.header(name).is_none() {
                    ctx.insert_header(name.clone(), value.clone());
                }
            }
            next.proceed(ctx).await;
        })
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::{run_chain, InterceptorRegistry, Terminal};
    use crate::method::RestMethod;
    use crate::request::Params;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    #[derive(Default)]
    struct CaptureHeaders(Mutex<BTreeMap<String, String>>);

    impl Terminal for CaptureHeaders {
        fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, ()> {
            Box::pin(async move {
                *self.0.lock() = ctx.headers().clone();
            })
        }
    }

    fn context() -> RequestContext {
        RequestContext::new("ping", RestMethod::Get, Params::new(), CancellationToken::new())
    }

    #[tokio::test]
    async fn test_injects_headers() {
        let registry = InterceptorRegistry::new();
        registry.add(Arc::new(HeaderInterceptor::new().header("X-Trace", "abc")));

        let terminal = CaptureHeaders::default();
        run_chain(&registry.snapshot(), &terminal, &mut context()).await;

        assert_eq!(terminal.0.lock().get("X-Trace").map(String::as_str), Some("abc"));
    }

    #[tokio::test]
    async fn test_keeps_existing_header_by_default() {
        let registry = InterceptorRegistry::new();
        registry.add(Arc::new(
            HeaderInterceptor::new().header("X-Tenant", "a").with_priority(1),
        ));
        registry.add(Arc::new(HeaderInterceptor::new().header("X-Tenant", "b")));

        let terminal = CaptureHeaders::default();
        run_chain(&registry.snapshot(), &terminal, &mut context()).await;

        assert_eq!(terminal.0.lock().get("X-Tenant").map(String::as_str), Some("b"));
    }

    #[tokio::test]
    async fn test_existing_header_matches_any_case() {
        let registry = InterceptorRegistry::new();
        registry.add(Arc::new(
            HeaderInterceptor::new().header("x-tenant", "a").with_priority(1),
        ));
        registry.add(Arc::new(HeaderInterceptor::new().header("X-Tenant", "b")));

        let terminal = CaptureHeaders::default();
        run_chain(&registry.snapshot(), &terminal, &mut context()).await;

        let headers = terminal.0.lock();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("X-Tenant").map(String::as_str), Some("b"));
    }

    #[tokio::test]
    async fn test_overwrite_replaces_header() {
        let registry = InterceptorRegistry::new();
        registry.add(Arc::new(HeaderInterceptor::new().header("X-Tenant", "a")));
        registry.add(Arc::new(
            HeaderInterceptor::new()
                .header("X-Tenant", "b")
                .overwrite(true)
                .with_priority(5),
        ));

        let terminal = CaptureHeaders::default();
        run_chain(&registry.snapshot(), &terminal, &mut context()).await;

        assert_eq!(terminal.0.lock().get("X-Tenant").map(String::as_str), Some("b"));
    }
}
