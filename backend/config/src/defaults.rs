//! Config defaults: fills unset optional sections after loading.

use std::path::PathBuf;

use crate::schema::{ExportConfig, InkreadConfig, LoggingConfig, OcrConfig, StoreConfig};

pub const DEFAULT_FUNCTIONS_PATH: &str = "functions/v1";

pub const DEFAULT_FUNCTION_NAME: &str = "ocr-process";

pub const DEFAULT_REST_PATH: &str = "rest/v1";

pub const DEFAULT_TABLE: &str = "ocr_conversions";

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_EXPORT_DIR: &str = ".";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: InkreadConfig) -> InkreadConfig {
    let config = apply_ocr_defaults(config);
    let config = apply_store_defaults(config);
    let config = apply_logging_defaults(config);
    apply_export_defaults(config)
}

fn apply_ocr_defaults(mut config: InkreadConfig) -> InkreadConfig {
    let ocr = config.ocr.get_or_insert_with(OcrConfig::default);
    if ocr.functions_path.is_none() {
        ocr.functions_path = Some(DEFAULT_FUNCTIONS_PATH.to_string());
    }
    if ocr.function_name.is_none() {
        ocr.function_name = Some(DEFAULT_FUNCTION_NAME.to_string());
    }
    config
}

fn apply_store_defaults(mut config: InkreadConfig) -> InkreadConfig {
    let store = config.store.get_or_insert_with(StoreConfig::default);
    if store.rest_path.is_none() {
        store.rest_path = Some(DEFAULT_REST_PATH.to_string());
    }
    if store.table.is_none() {
        store.table = Some(DEFAULT_TABLE.to_string());
    }
    config
}

fn apply_logging_defaults(mut config: InkreadConfig) -> InkreadConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    config
}

fn apply_export_defaults(mut config: InkreadConfig) -> InkreadConfig {
    let export = config.export.get_or_insert_with(ExportConfig::default);
    if export.dir.is_none() {
        export.dir = Some(PathBuf::from(DEFAULT_EXPORT_DIR));
    }
    config
}
