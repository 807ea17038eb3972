//! Panel client.
//!
//! [`PanelClient`] signs each call, runs it through the interceptor chain
//! and hands it to the retrying [`Executor`]. Calls either run on the
//! caller's task ([`PanelClient::execute`]) or on a bounded worker pool
//! ([`PanelClient::submit`], with an optional deadline). The
//! [`blocking`] module wraps the same client for callers without a runtime.
//!
//! ## Examples
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use panel::{Endpoint, PanelClient, PanelConfig, RestMethod};
//! use panel::interceptor::LoggingInterceptor;
//! use panel::response::JsonFormat;
//!
//! let client = PanelClient::new(PanelConfig::from_env()?)?;
//! client.add_interceptor(Arc::new(LoggingInterceptor::new()));
//!
//! let sites: Arc<Endpoint<JsonFormat<serde_json::Value>>> = Arc::new(
//!     Endpoint::builder()
//!         .method(RestMethod::Post)
//!         .path("data?action=getData")
//!         .param("table", "sites")
//!         .build(),
//! );
//!
//! let result = client
//!     .execute_with_timeout(sites, Duration::from_secs(5))
//!     .await?;
//! ```

pub mod blocking;
mod executor;
mod handle;
mod panel_client;

pub use executor::Executor;
pub use handle::CallHandle;
pub use panel_client::{default_worker_count, PanelClient};
