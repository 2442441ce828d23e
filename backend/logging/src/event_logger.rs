//! Conversion Event Logger
//!
//! Lifecycle events of a session written through `tracing` under the
//! `conversion_events` target, so the JSON file layer turns them into NDJSON.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversionEvent {
    Submitted { request: u64, image_bytes: usize },
    Extracted { request: u64, chars: usize },
    Stored { request: u64, conversion_id: String },
    StoreFailed { request: u64, error_msg: String },
    Superseded { request: u64 },
    Selected { conversion_id: String },
    Saved { conversion_id: String, chars: usize },
    Deleted { conversion_id: String },
    Failed { operation: String, error_msg: String },
}

impl ConversionEvent {
    fn is_failure(&self) -> bool {
        matches!(self, Self::StoreFailed { .. } | Self::Failed { .. })
    }
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: ConversionEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Log a lifecycle event with its error text redacted.
    pub fn log_event(session_id: &str, mut event: ConversionEvent) {
        match &mut event {
            ConversionEvent::StoreFailed { error_msg, .. }
            | ConversionEvent::Failed { error_msg, .. } => {
                *error_msg = redact_sensitive_data(error_msg);
            }
            _ => {}
        }

        let failure = event.is_failure();
        let entry = EventLogEntry {
            session_id: session_id.into(),
            timestamp: Utc::now(),
            event,
        };
        let payload = serde_json::to_string(&entry).unwrap_or_else(|_| format!("{entry:?}"));

        if failure {
            warn!(target: "conversion_events", event = %payload, "Conversion event");
        } else {
            info!(target: "conversion_events", event = %payload, "Conversion event");
        }
    }
}
