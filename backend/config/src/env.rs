//! Environment handling for config values.
//!
//! String values may reference `${VAR_NAME}` (uppercase names only), resolved
//! at load time; `$${VAR}` stays a literal `${VAR}`. After that, the
//! `INKREAD_*` variables override individual settings.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;

use crate::schema::{InkreadConfig, LoggingConfig, ServiceConfig};

pub const ENV_SERVICE_URL: &str = "INKREAD_SERVICE_URL";
pub const ENV_SERVICE_TOKEN: &str = "INKREAD_SERVICE_TOKEN";
pub const ENV_LOG: &str = "INKREAD_LOG";

/// `$${NAME}` or `${NAME}`; group 1 is the optional escape.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references from the process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    substitute_value(value, &std::env::vars().collect(), "")
}

/// Substitute env vars from a provided map.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => {
            let result: Result<Vec<_>> = arr
                .iter()
                .enumerate()
                .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
                .collect();
            Ok(Value::Array(result?))
        }
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let var_name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{var_name}}}");
        }
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: var_name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(substituted.into_owned())
}

/// Apply `INKREAD_*` overrides from the process environment.
pub fn apply_env_overrides(config: InkreadConfig) -> InkreadConfig {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply `INKREAD_*` overrides from a provided map. Empty values are ignored.
pub fn apply_env_overrides_with(
    mut config: InkreadConfig,
    env: &HashMap<String, String>,
) -> InkreadConfig {
    let get = |key: &str| env.get(key).filter(|v| !v.trim().is_empty()).cloned();

    if let Some(url) = get(ENV_SERVICE_URL) {
        config.service.get_or_insert_with(ServiceConfig::default).url = Some(url);
    }
    if let Some(token) = get(ENV_SERVICE_TOKEN) {
        config.service.get_or_insert_with(ServiceConfig::default).token = Some(token);
    }
    if let Some(level) = get(ENV_LOG) {
        config.logging.get_or_insert_with(LoggingConfig::default).level = Some(level);
    }
    config
}
