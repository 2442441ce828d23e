//! Structured logging for Inkread.
//!
//! Console output, optional rolling NDJSON files, redaction of tokens and
//! image payloads, and the conversion lifecycle event log.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{ConversionEvent, EventLogEntry, EventLogger};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
