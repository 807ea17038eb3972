//! Handles for calls running on the worker pool.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::PanelError;
use crate::response::PanelResult;

type CallResult<T> = Result<PanelResult<T>, PanelError>;

/// A call submitted to the client's worker pool.
///
/// Await it for the outcome, or call [`wait`](Self::wait) from a thread
/// outside the runtime. Dropping the handle detaches the call; use
/// [`cancel`](Self::cancel) to stop it at its next chain hop or retry
/// boundary.
#[derive(Debug)]
pub struct CallHandle<T> {
    receiver: oneshot::Receiver<CallResult<T>>,
    cancel: CancellationToken,
}

impl<T> CallHandle<T> {
    pub(crate) fn new(receiver: oneshot::Receiver<CallResult<T>>, cancel: CancellationToken) -> Self {
        Self { receiver, cancel }
    }

    /// Requests cancellation of the call.
    ///
    /// An attempt already on the wire is not interrupted, but no further
    /// interceptor hops or retries run.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Blocks the current thread until the call finishes.
    ///
    /// ## Panics
    ///
    /// Panics when called from within an asynchronous execution context;
    /// `.await` the handle there instead.
    pub fn wait(self) -> CallResult<T> {
        self.receiver
            .blocking_recv()
            .unwrap_or(Err(PanelError::Cancelled))
    }
}

impl<T> Future for CallHandle<T> {
    type Output = CallResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A dropped sender means the worker was torn down before replying.
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(PanelError::Cancelled)))
    }
}
