//! Priority-ordered middleware around the network call.
//!
//! An [`Interceptor`] receives the [`RequestContext`] and a [`Next`]
//! continuation. Work done before `next.proceed(ctx)` runs on the way in,
//! work after it runs on the way out, and not calling it at all ends the
//! chain early (for caches and fallbacks).
//!
//! Interceptors run in ascending [`priority`](Interceptor::priority) order;
//! equal priorities keep their registration order. Each call runs against
//! the snapshot of the registry taken when it started, so registering an
//! interceptor never affects calls already in flight.
//!
//! ```rust,ignore
//! use futures::future::BoxFuture;
//! use panel::interceptor::{Interceptor, Next};
//! use panel::RequestContext;
//!
//! struct Tenant(String);
//!
//! impl Interceptor for Tenant {
//!     fn intercept<'a>(&'a self, ctx: &'a mut RequestContext, next: Next<'a>) -> BoxFuture<'a, ()> {
//!         Box::pin(async move {
//!             ctx.insert_header("X-Tenant", self.0.clone());
//!             next.proceed(ctx).await;
//!         })
//!     }
//! }
//! ```

mod headers;
mod logging;

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::RwLock;

use crate::context::RequestContext;
use crate::error::PanelError;

pub use headers::HeaderInterceptor;
pub use logging::LoggingInterceptor;

/// Immutable, priority-sorted list of interceptors captured at call start.
pub type InterceptorSnapshot = Arc<[Arc<dyn Interceptor>]>;

/// Cross-cutting behavior wrapped around a panel call.
///
/// An interceptor that skips `next` must leave a response, a result or an
/// error on the context. To turn a failure into a success it must call
/// [`RequestContext::recover`]; clearing the error without a result is a
/// misuse and fails the call with [`PanelError::IncompleteChain`].
pub trait Interceptor: Send + Sync {
    fn intercept<'a>(&'a self, ctx: &'a mut RequestContext, next: Next<'a>) -> BoxFuture<'a, ()>;

    /// Lower values run first (outermost).
    fn priority(&self) -> i32 {
        0
    }
}

/// The step the chain ends in.
pub(crate) trait Terminal: Send + Sync {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, ()>;
}

/// Continuation handed to each interceptor.
///
/// Holds the snapshot and the index of the next hop; consuming it with
/// [`proceed`](Next::proceed) advances exactly once.
pub struct Next<'a> {
    chain: &'a [Arc<dyn Interceptor>],
    index: usize,
    terminal: &'a dyn Terminal,
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.index)
            .field("len", &self.chain.len())
            .finish()
    }
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [Arc<dyn Interceptor>], terminal: &'a dyn Terminal) -> Self {
        Self {
            chain,
            index: 0,
            terminal,
        }
    }

    /// Runs the rest of the chain.
    ///
    /// A cancelled context records [`PanelError::Cancelled`] instead of
    /// advancing.
    pub fn proceed<'c>(self, ctx: &'c mut RequestContext) -> BoxFuture<'c, ()>
    where
        'a: 'c,
    {
        Box::pin(async move {
            if ctx.is_cancelled() {
                ctx.fail(PanelError::Cancelled);
                return;
            }

            match self.chain.get(self.index) {
                Some(interceptor) => {
                    let next = Next {
                        chain: self.chain,
                        index: self.index + 1,
                        terminal: self.terminal,
                    };
                    interceptor.intercept(ctx, next).await;
                }
                None => self.terminal.call(ctx).await,
            }
        })
    }
}

/// Copy-on-write interceptor list owned by a client.
///
/// Registration takes a write lock and swaps in a freshly sorted list; a
/// call only clones the current `Arc`.
pub struct InterceptorRegistry {
    interceptors: RwLock<InterceptorSnapshot>,
}

impl Default for InterceptorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InterceptorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let priorities: Vec<i32> = self.snapshot().iter().map(|i| i.priority()).collect();
        f.debug_struct("InterceptorRegistry")
            .field("priorities", &priorities)
            .finish()
    }
}

impl InterceptorRegistry {
    pub fn new() -> Self {
        Self {
            interceptors: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Adds an interceptor and re-sorts by priority.
    pub fn add(&self, interceptor: Arc<dyn Interceptor>) {
        let mut guard = self.interceptors.write();
        let mut list = guard.to_vec();
        list.push(interceptor);
        list.sort_by_key(|i| i.priority());
        *guard = Arc::from(list);
    }

    /// The list as it stands right now.
    pub fn snapshot(&self) -> InterceptorSnapshot {
        self.interceptors.read().clone()
    }

    pub fn len(&self) -> usize {
        self.interceptors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Drives `ctx` through `chain` and into `terminal`.
pub(crate) async fn run_chain(
    chain: &[Arc<dyn Interceptor>],
    terminal: &dyn Terminal,
    ctx: &mut RequestContext,
) {
    Next::new(chain, terminal).proceed(ctx).await;
}
