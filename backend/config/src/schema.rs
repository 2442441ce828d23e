//! Inkread runtime configuration schema, typed for serde YAML/JSON.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use inkread_core::ConfigError;

use crate::defaults::{
    DEFAULT_EXPORT_DIR, DEFAULT_FUNCTIONS_PATH, DEFAULT_FUNCTION_NAME, DEFAULT_LOG_LEVEL,
    DEFAULT_REST_PATH, DEFAULT_TABLE,
};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for Inkread.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InkreadConfig {
    /// Hosted backend base URL and token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceConfig>,

    /// Text-extraction function
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr: Option<OcrConfig>,

    /// Conversion record resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    /// Where exported text files go
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Sent both as bearer token and as `apikey`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// trace | debug | info | warn | error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Enables the rolling JSON log file when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved values
// ---------------------------------------------------------------------------

/// Everything needed to build the OCR and store clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub functions_url: String,
    pub function_name: String,
    pub rest_url: String,
    pub table: String,
    pub token: String,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_matches('/'))
}

impl InkreadConfig {
    pub fn service_url(&self) -> Option<&str> {
        non_empty(self.service.as_ref().and_then(|s| s.url.as_ref()))
    }

    pub fn service_token(&self) -> Option<&str> {
        non_empty(self.service.as_ref().and_then(|s| s.token.as_ref()))
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self) -> Option<&std::path::Path> {
        self.logging.as_ref().and_then(|l| l.dir.as_deref())
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export
            .as_ref()
            .and_then(|e| e.dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_DIR))
    }

    /// Resolve the service endpoints. Missing URL or token is fatal.
    pub fn endpoints(&self) -> Result<Endpoints, ConfigError> {
        let url = self
            .service_url()
            .ok_or_else(|| ConfigError::Missing("service.url".into()))?;
        let token = self
            .service_token()
            .ok_or_else(|| ConfigError::Missing("service.token".into()))?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                path: "service.url".into(),
                message: format!("'{url}' is not an http(s) URL"),
            });
        }

        let ocr = self.ocr.clone().unwrap_or_default();
        let store = self.store.clone().unwrap_or_default();
        Ok(Endpoints {
            functions_url: join_url(
                url,
                ocr.functions_path.as_deref().unwrap_or(DEFAULT_FUNCTIONS_PATH),
            ),
            function_name: ocr
                .function_name
                .unwrap_or_else(|| DEFAULT_FUNCTION_NAME.to_string()),
            rest_url: join_url(url, store.rest_path.as_deref().unwrap_or(DEFAULT_REST_PATH)),
            table: store.table.unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            token: token.to_string(),
        })
    }
}
