//! Result envelope and response body formats.
//!
//! [`PanelResult`] is the uniform `{success, message, data}` value handed
//! back to callers. The [`ResponseFormat`] implementations turn a raw body
//! into the typed `data` carried by that result.

mod envelope;
mod format;

pub(crate) use envelope::Envelope;
pub use envelope::PanelResult;
pub use format::{EnvelopeDataFormat, JsonFormat, PlainTextFormat, ResponseFormat};
