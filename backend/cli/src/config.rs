use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use inkread_config::InkreadConfig;
use inkread_ocr::RemoteOcrClient;
use inkread_session::ConversionController;
use inkread_store::RestConversionStore;

/// Wire the remote OCR and store clients into a controller.
pub fn build_controller(config: &InkreadConfig) -> Result<ConversionController> {
    let endpoints = config.endpoints()?;

    let ocr = RemoteOcrClient::with_function(
        &endpoints.functions_url,
        &endpoints.function_name,
        endpoints.token.clone(),
    );
    let store = RestConversionStore::new(&endpoints.rest_url, &endpoints.table, endpoints.token);
    info!(ocr = %ocr.endpoint(), store = %store.table_url(), "Clients configured");

    Ok(ConversionController::new(Arc::new(ocr), Arc::new(store)))
}
