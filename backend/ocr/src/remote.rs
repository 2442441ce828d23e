use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use inkread_core::{ImageData, OcrClient, OcrServiceError};

/// Name of the hosted extraction function.
pub const DEFAULT_FUNCTION: &str = "ocr-process";

const FALLBACK_ERROR: &str = "OCR processing failed";

/// HTTP client for the hosted `ocr-process` function.
pub struct RemoteOcrClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl RemoteOcrClient {
    /// `functions_url` is the base the function name is appended to,
    /// e.g. `https://project.example.co/functions/v1`.
    pub fn new(functions_url: &str, token: impl Into<String>) -> Self {
        Self::with_function(functions_url, DEFAULT_FUNCTION, token)
    }

    pub fn with_function(functions_url: &str, function: &str, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!(
                "{}/{}",
                functions_url.trim_end_matches('/'),
                function.trim_start_matches('/')
            ),
            token: token.into(),
        }
    }

    /// Reuse an existing connection pool.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request(&self, image: &ImageData) -> RequestBuilder {
        // The function always expects a PNG header, whatever the upload was.
        let body = OcrRequest {
            image_base64: format!("data:image/png;base64,{}", image.payload()),
        };
        self.client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OcrRequest {
    image_base64: String,
}

#[derive(Deserialize)]
struct OcrResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Map a raw function response to the extracted text.
fn interpret_response(status: StatusCode, body: &str) -> Result<String, OcrServiceError> {
    let parsed = serde_json::from_str::<OcrResponse>(body);

    if !status.is_success() {
        let message = parsed
            .ok()
            .and_then(|r| r.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_ERROR.to_string());
        return Err(OcrServiceError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let response = parsed.map_err(|e| OcrServiceError::MalformedResponse(e.to_string()))?;
    Ok(response.text.unwrap_or_default())
}

#[async_trait]
impl OcrClient for RemoteOcrClient {
    fn name(&self) -> &str {
        "remote"
    }

    async fn extract_text(&self, image: &ImageData) -> Result<String, OcrServiceError> {
        let start = Instant::now();
        debug!(endpoint = %self.endpoint, bytes = image.len(), "Sending image to OCR function");

        let response = self
            .build_request(image)
            .send()
            .await
            .map_err(|e| OcrServiceError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OcrServiceError::Transport(e.to_string()))?;

        let result = interpret_response(status, &body);
        debug!(
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "OCR function responded"
        );
        result
    }
}
