//! The single channel every controller failure goes through.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{Level, error, warn};

use inkread_logging::{ConversionEvent, EventLogger};

use crate::event::SessionEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A user action failed and needs re-action (re-upload, re-save).
    Error,
    /// A user action failed but nothing on screen is wrong.
    Warning,
    /// Background refresh; logged only.
    Background,
}

impl Severity {
    pub fn is_user_visible(self) -> bool {
        !matches!(self, Severity::Background)
    }

    /// Log level of the failure. Background failures are still failures.
    pub fn log_level(self) -> Level {
        match self {
            Severity::Error => Level::ERROR,
            Severity::Warning | Severity::Background => Level::WARN,
        }
    }
}

/// The one user-visible message slot. Last report wins.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    pub at: DateTime<Utc>,
}

pub(crate) struct Reporter {
    session_id: String,
    events: broadcast::Sender<SessionEvent>,
}

impl Reporter {
    pub(crate) fn new(session_id: String, events: broadcast::Sender<SessionEvent>) -> Self {
        Self { session_id, events }
    }

    pub(crate) fn session_id(&self) -> &str {
        &self.session_id
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn log(&self, event: ConversionEvent) {
        EventLogger::log_event(&self.session_id, event);
    }

    /// Log a failure and, unless it is background noise, show it to the user.
    pub(crate) fn report(
        &self,
        slot: &mut Option<Notice>,
        severity: Severity,
        operation: &str,
        message: String,
        cause: &dyn std::fmt::Display,
    ) {
        if severity.log_level() == Level::ERROR {
            error!(operation, error = %cause, "{message}");
        } else {
            warn!(operation, error = %cause, "{message}");
        }
        self.log(ConversionEvent::Failed {
            operation: operation.to_string(),
            error_msg: cause.to_string(),
        });

        if severity.is_user_visible() {
            let notice = Notice {
                severity,
                message,
                at: Utc::now(),
            };
            *slot = Some(notice.clone());
            self.emit(SessionEvent::Notice(notice));
        }
    }
}
