//! The async panel client.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tokio::sync::{oneshot, Semaphore};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, instrument, warn, Span};

use super::executor::{classify, Executor};
use super::handle::CallHandle;
use crate::config::PanelConfig;
use crate::context::RequestContext;
use crate::error::{ConfigError, PanelError};
use crate::interceptor::{run_chain, Interceptor, InterceptorRegistry, Terminal};
use crate::request::{PanelRequest, Params};
use crate::response::PanelResult;
use crate::signer::{RequestSigner, REQUEST_TIME, REQUEST_TOKEN};
use crate::transport::{ReqwestTransport, Transport};

/// Number of calls the worker pool runs at once: one per available CPU.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Async client for a panel's management API.
///
/// Every call is signed, passed through the registered interceptors and
/// sent by the retrying [`Executor`]. [`execute`](Self::execute) drives a
/// call on the caller's task; [`submit`](Self::submit) hands it to a
/// bounded worker pool and returns a [`CallHandle`].
///
/// Cloning is cheap and clones share the pool, the interceptors and the
/// shutdown state.
///
/// ## Examples
///
/// ```rust,ignore
/// use panel::{Endpoint, PanelClient, PanelConfig, RestMethod};
/// use panel::response::JsonFormat;
///
/// let config = PanelConfig::builder()
///     .base_url("https://panel.example.com:8888")
///     .api_key(std::env::var("PANEL_API_KEY")?)
///     .build();
/// let client = PanelClient::new(config)?;
///
/// let total: Endpoint<JsonFormat<serde_json::Value>> = Endpoint::builder()
///     .method(RestMethod::Post)
///     .path("system?action=GetSystemTotal")
///     .build();
///
/// let result = client.execute(&total).await?;
/// println!("{:?}", result.data());
///
/// client.close().await;
/// ```
pub struct PanelClient<T: Transport = ReqwestTransport> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for PanelClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> std::fmt::Debug for PanelClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelClient")
            .field("config", &self.inner.config)
            .field("interceptors", &self.inner.interceptors)
            .field("closed", &self.is_closed())
            .finish()
    }
}

struct Inner<T: Transport> {
    config: Arc<PanelConfig>,
    executor: Executor<T>,
    interceptors: InterceptorRegistry,
    signer: RequestSigner,
    workers: Arc<Semaphore>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    closed: AtomicBool,
    runtime: Handle,
}

impl PanelClient<ReqwestTransport> {
    /// Creates a client with the default `reqwest` transport on the current
    /// tokio runtime.
    ///
    /// ## Errors
    ///
    /// Returns [`PanelError::Validation`] if the config is invalid, the HTTP
    /// client cannot be built, or no runtime is running.
    pub fn new(config: PanelConfig) -> Result<Self, PanelError> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> PanelClient<T> {
    /// Creates a client over a custom transport on the current tokio runtime.
    pub fn with_transport(config: PanelConfig, transport: T) -> Result<Self, PanelError> {
        let runtime = Handle::try_current().map_err(|e| ConfigError::NoRuntime(e.to_string()))?;
        Self::with_runtime(config, transport, runtime, default_worker_count())
    }

    /// Creates a client whose worker pool runs on `runtime` and admits at
    /// most `workers` calls at once.
    pub fn with_runtime(
        config: PanelConfig,
        transport: T,
        runtime: Handle,
        workers: usize,
    ) -> Result<Self, PanelError> {
        config.validate()?;
        let signer = RequestSigner::new(&config.api_key);
        let config = Arc::new(config);
        let executor = Executor::new(transport, Arc::clone(&config))?;

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                executor,
                interceptors: InterceptorRegistry::new(),
                signer,
                workers: Arc::new(Semaphore::new(workers.max(1))),
                tracker: TaskTracker::new(),
                shutdown: CancellationToken::new(),
                closed: AtomicBool::new(false),
                runtime,
            }),
        })
    }

    pub fn config(&self) -> &PanelConfig {
        &self.inner.config
    }

    /// Registers an interceptor.
    ///
    /// Calls already in flight keep the interceptor list they started with.
    pub fn add_interceptor(&self, interceptor: Arc<dyn Interceptor>) {
        self.inner.interceptors.add(interceptor);
    }

    pub fn interceptors(&self) -> &InterceptorRegistry {
        &self.inner.interceptors
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Executes a call on the current task, including all retries.
    ///
    /// ## Errors
    ///
    /// Returns the final classified error of the call; see [`PanelError`].
    pub async fn execute<R>(&self, request: &R) -> Result<PanelResult<R::Output>, PanelError>
    where
        R: PanelRequest + ?Sized,
    {
        self.ensure_open()?;
        let cancel = self.inner.shutdown.child_token();
        self.inner.dispatch(request, cancel).await
    }

    /// Submits a call to the worker pool.
    ///
    /// ## Errors
    ///
    /// Returns [`PanelError::Closed`] without submitting anything once the
    /// client is closed.
    pub fn submit<R>(&self, request: Arc<R>) -> Result<CallHandle<R::Output>, PanelError>
    where
        R: PanelRequest + ?Sized + 'static,
    {
        self.ensure_open()?;

        let cancel = self.inner.shutdown.child_token();
        let (tx, rx) = oneshot::channel();
        let inner = Arc::clone(&self.inner);
        let call_cancel = cancel.clone();

        self.inner.tracker.spawn_on(
            async move {
                let shutdown = inner.shutdown.clone();
                let call = async {
                    match Arc::clone(&inner.workers).acquire_owned().await {
                        Ok(_permit) => inner.dispatch(request.as_ref(), call_cancel).await,
                        Err(_) => Err(PanelError::Closed),
                    }
                };

                let result = tokio::select! {
                    biased;
                    () = shutdown.cancelled() => Err(PanelError::Cancelled),
                    result = call => result,
                };
                // The caller may have dropped the handle.
                let _ = tx.send(result);
            },
            &self.inner.runtime,
        );

        Ok(CallHandle::new(rx, cancel))
    }

    /// Submits a call with a hard deadline measured from now.
    ///
    /// A timeout too large to represent, such as `Duration::MAX`, means no
    /// deadline.
    ///
    /// A separate timer task watches the call. If the deadline passes first,
    /// the returned handle resolves to [`PanelError::Timeout`] and the call
    /// is cancelled so it makes no further attempts; an attempt already on
    /// the wire finishes in the background and its result is discarded.
    pub fn submit_with_timeout<R>(
        &self,
        request: Arc<R>,
        timeout: Duration,
    ) -> Result<CallHandle<R::Output>, PanelError>
    where
        R: PanelRequest + ?Sized + 'static,
    {
        let deadline = tokio::time::Instant::now().checked_add(timeout);
        let call = self.submit(request)?;
        // A deadline past the clock's range never fires.
        let Some(deadline) = deadline else {
            return Ok(call);
        };
        let cancel = call.cancel_token();
        let after_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let (tx, rx) = oneshot::channel();

        let timer_cancel = cancel.clone();
        self.inner.runtime.spawn(async move {
            let result = match tokio::time::timeout_at(deadline, call).await {
                Ok(result) => result,
                Err(_) => {
                    timer_cancel.cancel();
                    warn!(after_ms, "Panel call exceeded its deadline");
                    Err(PanelError::Timeout { after_ms })
                }
            };
            let _ = tx.send(result);
        });

        Ok(CallHandle::new(rx, cancel))
    }

    /// Submits a call and waits for it, failing with
    /// [`PanelError::Timeout`] once `timeout` has elapsed.
    pub async fn execute_with_timeout<R>(
        &self,
        request: Arc<R>,
        timeout: Duration,
    ) -> Result<PanelResult<R::Output>, PanelError>
    where
        R: PanelRequest + ?Sized + 'static,
    {
        self.submit_with_timeout(request, timeout)?.await
    }

    /// Stops accepting calls and drains the worker pool.
    ///
    /// Pooled calls get the configured grace period to finish; whatever is
    /// still running afterwards is cancelled. Calls on caller tasks observe
    /// cancellation at their next chain hop or retry boundary. Calling
    /// `close` again does nothing.
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let grace = self.inner.config.shutdown_grace();
        info!(pending = self.inner.tracker.len(), "Closing panel client");
        self.inner.tracker.close();

        if tokio::time::timeout(grace, self.inner.tracker.wait())
            .await
            .is_err()
        {
            warn!(
                pending = self.inner.tracker.len(),
                grace_ms = self.inner.config.shutdown_grace_ms,
                "Grace period elapsed, cancelling in-flight panel calls"
            );
        }

        self.inner.shutdown.cancel();
        self.inner.tracker.wait().await;
        info!("Panel client closed");
    }

    fn ensure_open(&self) -> Result<(), PanelError> {
        if self.is_closed() {
            return Err(PanelError::Closed);
        }
        Ok(())
    }
}

impl<T: Transport> Inner<T> {
    #[instrument(
        name = "panel_request",
        skip(self, request, cancel),
        fields(
            http.method = %request.method(),
            http.url = tracing::field::Empty,
            panel.endpoint = request.endpoint(),
            http.status_code = tracing::field::Empty,
            panel.attempts = tracing::field::Empty,
            otel.kind = "client",
            otel.status_code = tracing::field::Empty,
        )
    )]
    async fn dispatch<R>(
        &self,
        request: &R,
        cancel: CancellationToken,
    ) -> Result<PanelResult<R::Output>, PanelError>
    where
        R: PanelRequest + ?Sized,
    {
        let result = self.run(request, cancel).await;
        Span::current().record("otel.status_code", if result.is_ok() { "OK" } else { "ERROR" });
        result
    }

    async fn run<R>(
        &self,
        request: &R,
        cancel: CancellationToken,
    ) -> Result<PanelResult<R::Output>, PanelError>
    where
        R: PanelRequest + ?Sized,
    {
        let mut params = request.params();
        self.sign(&mut params)?;

        let mut ctx = RequestContext::new(request.endpoint(), request.method(), params, cancel);
        let chain = self.interceptors.snapshot();
        let terminal = ExecutorTerminal {
            executor: &self.executor,
            request,
        };
        run_chain(&chain, &terminal, &mut ctx).await;

        resolve(&mut ctx, request, &self.config)
    }

    /// Adds the signature pair unless the caller already supplied both.
    fn sign(&self, params: &mut Params) -> Result<(), ConfigError> {
        match (params.contains_key(REQUEST_TIME), params.contains_key(REQUEST_TOKEN)) {
            (true, true) => Ok(()),
            (false, false) => {
                self.signer.sign_now(params);
                Ok(())
            }
            (true, false) => Err(ConfigError::PartialSignature {
                present: REQUEST_TIME,
            }),
            (false, true) => Err(ConfigError::PartialSignature {
                present: REQUEST_TOKEN,
            }),
        }
    }
}

/// Turns whatever the chain left on the context into the caller's result.
fn resolve<R>(
    ctx: &mut RequestContext,
    request: &R,
    config: &PanelConfig,
) -> Result<PanelResult<R::Output>, PanelError>
where
    R: PanelRequest + ?Sized,
{
    if let Some(error) = ctx.take_error() {
        return Err(error);
    }
    if let Some(result) = ctx.take_result() {
        return result
            .downcast::<PanelResult<R::Output>>()
            .map(|result| *result)
            .map_err(|_| PanelError::ResultTypeMismatch);
    }
    // An interceptor supplied a raw response without running the executor.
    if let Some(response) = ctx.take_response() {
        return classify(request, &response, config).into_result();
    }
    Err(PanelError::IncompleteChain)
}

struct ExecutorTerminal<'r, T: Transport, R: ?Sized> {
    executor: &'r Executor<T>,
    request: &'r R,
}

impl<T, R> Terminal for ExecutorTerminal<'_, T, R>
where
    T: Transport,
    R: PanelRequest + ?Sized,
{
    fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, ()> {
        Box::pin(self.executor.execute(ctx, self.request))
    }
}
