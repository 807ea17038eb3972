//! Request-execution engine for web-panel management APIs.
//!
//! The `panel` crate turns a request descriptor into a signed, retried,
//! optionally asynchronous HTTP call against a panel's management API and
//! hands back a uniform [`PanelResult`]. It does not know any individual
//! endpoint; callers describe each call through the [`PanelRequest`] trait
//! or the generic [`Endpoint`] type.
//!
//! ## Features
//!
//! - **Signing**: every call carries `request_time` and `request_token`
//!   derived from the shared API key
//! - **Interceptors**: priority-ordered middleware around the network call,
//!   snapshotted per call
//! - **Bounded retry**: fixed-interval retry on transient network faults and
//!   configured HTTP statuses
//! - **Async and blocking entry points**: caller-task execution, a bounded
//!   worker pool with deadlines, and a blocking facade
//! - **Layered error handling**: every failure is classified into
//!   [`PanelError`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use panel::{Endpoint, PanelClient, PanelConfig, RestMethod};
//! use panel::response::EnvelopeDataFormat;
//!
//! #[derive(serde::Deserialize)]
//! struct Site { id: u64, name: String }
//!
//! let client = PanelClient::new(PanelConfig::from_env()?)?;
//!
//! let sites: Endpoint<EnvelopeDataFormat<Vec<Site>>> = Endpoint::builder()
//!     .method(RestMethod::Post)
//!     .path("data?action=getData")
//!     .param("table", "sites")
//!     .build();
//!
//! let result = client.execute(&sites).await?;
//! for site in result.into_data().unwrap_or_default() {
//!     println!("{} {}", site.id, site.name);
//! }
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod interceptor;
pub mod method;
pub mod request;
pub mod response;
pub mod signer;
pub mod transport;

// Re-exports for convenience
pub use client::{blocking, CallHandle, Executor, PanelClient};
pub use config::{PanelConfig, PanelConfigBuilder};
pub use context::{RawResponse, RequestContext};
pub use endpoint::{Endpoint, EndpointBuilder};
pub use error::{ConfigError, NetworkError, PanelError, ParseError};
pub use interceptor::{Interceptor, InterceptorRegistry, Next};
pub use method::RestMethod;
pub use request::{PanelRequest, Params};
pub use response::{PanelResult, ResponseFormat};
pub use signer::{sign, RequestSigner};
pub use transport::{ReqwestTransport, Transport, WireRequest};
