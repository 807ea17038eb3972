//! A blocking facade over [`PanelClient`].
//!
//! [`BlockingPanelClient`] owns a multi-threaded tokio runtime whose worker
//! threads form the pool for asynchronous calls. [`execute`] blocks the
//! calling thread for the whole call, retries included.
//!
//! Do not use this client from within an async runtime; use
//! [`PanelClient`] there.
//!
//! [`execute`]: BlockingPanelClient::execute

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::{Builder, Runtime};

use super::handle::CallHandle;
use super::panel_client::{default_worker_count, PanelClient};
use crate::config::PanelConfig;
use crate::error::{ConfigError, PanelError};
use crate::interceptor::Interceptor;
use crate::request::PanelRequest;
use crate::response::PanelResult;
use crate::transport::{ReqwestTransport, Transport};

/// Thread-blocking panel client.
///
/// ## Examples
///
/// ```rust,ignore
/// use panel::blocking::BlockingPanelClient;
///
/// let client = BlockingPanelClient::new(PanelConfig::from_env()?)?;
/// let result = client.execute(&endpoint)?;
/// client.close();
/// ```
#[derive(Debug)]
pub struct BlockingPanelClient<T: Transport = ReqwestTransport> {
    client: PanelClient<T>,
    runtime: Runtime,
}

impl BlockingPanelClient<ReqwestTransport> {
    /// Creates a client with the default `reqwest` transport.
    pub fn new(config: PanelConfig) -> Result<Self, PanelError> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> BlockingPanelClient<T> {
    /// Creates a client over a custom transport.
    pub fn with_transport(config: PanelConfig, transport: T) -> Result<Self, PanelError> {
        let workers = default_worker_count();
        let runtime = Builder::new_multi_thread()
            .worker_threads(workers)
            .thread_name("panel-worker")
            .enable_all()
            .build()
            .map_err(|e| ConfigError::NoRuntime(e.to_string()))?;

        let client = PanelClient::with_runtime(config, transport, runtime.handle().clone(), workers)?;
        Ok(Self { client, runtime })
    }

    /// The async client this facade drives.
    pub fn as_async(&self) -> &PanelClient<T> {
        &self.client
    }

    pub fn add_interceptor(&self, interceptor: Arc<dyn Interceptor>) {
        self.client.add_interceptor(interceptor);
    }

    /// Executes a call, blocking until it completes.
    pub fn execute<R>(&self, request: &R) -> Result<PanelResult<R::Output>, PanelError>
    where
        R: PanelRequest + ?Sized,
    {
        self.runtime.block_on(self.client.execute(request))
    }

    /// Submits a call to the worker pool without blocking.
    pub fn execute_async<R>(&self, request: Arc<R>) -> Result<CallHandle<R::Output>, PanelError>
    where
        R: PanelRequest + ?Sized + 'static,
    {
        self.client.submit(request)
    }

    /// Submits a call and blocks until it completes or `timeout` elapses.
    pub fn execute_async_with_timeout<R>(
        &self,
        request: Arc<R>,
        timeout: Duration,
    ) -> Result<PanelResult<R::Output>, PanelError>
    where
        R: PanelRequest + ?Sized + 'static,
    {
        self.client.submit_with_timeout(request, timeout)?.wait()
    }

    /// Closes the client, blocking while the pool drains.
    pub fn close(&self) {
        self.runtime.block_on(self.client.close());
    }

    pub fn is_closed(&self) -> bool {
        self.client.is_closed()
    }
}
