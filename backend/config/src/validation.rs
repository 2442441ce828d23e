//! Config validation with user-friendly messages.

use crate::schema::InkreadConfig;
use thiserror::Error;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &InkreadConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_service(config, &mut report);
    validate_store(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_service(config: &InkreadConfig, report: &mut ValidationReport) {
    match config.service_url() {
        None => report.error("service.url", "Service URL is required"),
        Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
            report.error("service.url", format!("'{url}' is not an http(s) URL"))
        }
        Some(url) if url.starts_with("http://") => {
            report.warn("service.url", "Token will be sent over plain http")
        }
        Some(_) => {}
    }
    if config.service_token().is_none() {
        report.error("service.token", "Service token is required");
    }
}

fn validate_store(config: &InkreadConfig, report: &mut ValidationReport) {
    let Some(store) = &config.store else { return };
    if let Some(table) = &store.table {
        if table.trim().is_empty() {
            report.error("store.table", "Table name cannot be empty");
        }
    }
}

fn validate_logging(config: &InkreadConfig, report: &mut ValidationReport) {
    let Some(logging) = &config.logging else { return };
    if let Some(level) = &logging.level {
        if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
            report.warn(
                "logging.level",
                format!("Unknown log level '{level}'; use one of {}", LOG_LEVELS.join(", ")),
            );
        }
    }
}
