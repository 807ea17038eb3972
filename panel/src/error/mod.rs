//! Layered error types for the panel crate.
//!
//! The error hierarchy is structured for actionable diagnostics:
//! - [`PanelError`] - Top-level error returned by every call entry point
//! - [`NetworkError`] - Connection, timeout and I/O faults from the transport
//! - [`ParseError`] - Response bodies that cannot become the expected type
//! - [`ConfigError`] - Invalid configuration or malformed descriptor parameters

mod config_error;
mod network_error;
mod panel_error;
mod parse_error;

pub use config_error::ConfigError;
pub use network_error::NetworkError;
pub use panel_error::PanelError;
pub use parse_error::ParseError;
