//! Connection-pooled `reqwest` transport.

use reqwest::Client;
use tracing::trace;

use super::{RawResponse, Transport, WireRequest};
use crate::config::PanelConfig;
use crate::error::{ConfigError, NetworkError};

const POOL_MAX_IDLE_PER_HOST: usize = 10;

/// [`Transport`] backed by a shared `reqwest::Client`.
///
/// The client is built once from the config (timeouts, user agent, TLS
/// verification) and reused for every call, so connections are pooled.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds the underlying HTTP client.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the TLS backend cannot be
    /// initialized.
    pub fn new(config: &PanelConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.read_timeout())
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(!config.verify_tls)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .build()?;

        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: &WireRequest) -> Result<RawResponse, NetworkError> {
        let mut builder = self
            .client
            .request(request.method.to_reqwest(), request.url.clone());

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        trace!(status, bytes = body.len(), "Received panel response");

        Ok(RawResponse { status, body })
    }
}
