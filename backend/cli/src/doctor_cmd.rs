//! CLI Doctor Command
//!
//! Checks the configuration and that the store answers.

use anyhow::Result;
use std::path::Path;

use inkread_config::{redact, validate, InkreadConfig};

use crate::config::build_controller;

/// Executes the full doctor diagnosis.
pub async fn run(config: &InkreadConfig, path: &Path) -> Result<()> {
    println!("\n🔍 Running Inkread Doctor...\n");

    let config_ok = check_config(config, path);
    let service_ok = config_ok && check_service(config).await;

    println!();
    if service_ok {
        println!("✅ All checks passed! Inkread is ready.");
    } else {
        println!("❌ Some checks failed! Please fix the errors above.");
    }

    println!("\nEffective configuration:");
    let value = serde_json::to_value(config)?;
    println!("{}", serde_json::to_string_pretty(&redact(&value))?);

    Ok(())
}

fn check_config(config: &InkreadConfig, path: &Path) -> bool {
    println!("Checking Configuration:");
    if path.exists() {
        println!("  🟢 {} found", path.display());
    } else {
        println!("  🟡 {} not found (using environment only)", path.display());
    }

    let report = validate(config);
    for error in &report.errors {
        println!("  🔴 {}: {}", error.path, error.message);
    }
    for warning in &report.warnings {
        println!("  🟡 {}: {}", warning.path, warning.message);
    }
    if report.is_valid() {
        println!("  🟢 Service URL and token are set");
    }
    report.is_valid()
}

async fn check_service(config: &InkreadConfig) -> bool {
    println!("Checking Conversion Store:");
    let controller = match build_controller(config) {
        Ok(controller) => controller,
        Err(e) => {
            println!("  🔴 {e}");
            return false;
        }
    };
    match controller.load_history().await {
        Ok(count) => {
            println!("  🟢 Store reachable ({count} recent conversions)");
            true
        }
        Err(e) => {
            println!("  🔴 {e}");
            false
        }
    }
}
