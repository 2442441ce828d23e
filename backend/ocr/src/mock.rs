use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use inkread_core::{ImageData, OcrClient, OcrServiceError};

struct Scripted {
    delay: Option<Duration>,
    result: Result<String, OcrServiceError>,
}

/// An OCR client that replays scripted responses in order.
///
/// Once the script runs out every call returns the fixed response.
pub struct MockOcrClient {
    script: Mutex<VecDeque<Scripted>>,
    fixed_response: String,
    calls: AtomicUsize,
}

impl MockOcrClient {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fixed_response: "Mock OCR text".to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_response(mut self, text: impl Into<String>) -> Self {
        self.fixed_response = text.into();
        self
    }

    /// Queue a successful extraction.
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.push(None, Ok(text.into()))
    }

    /// Queue a successful extraction that resolves after `delay`.
    pub fn then_delayed_text(self, delay: Duration, text: impl Into<String>) -> Self {
        self.push(Some(delay), Ok(text.into()))
    }

    /// Queue a failure.
    pub fn then_error(self, error: OcrServiceError) -> Self {
        self.push(None, Err(error))
    }

    fn push(mut self, delay: Option<Duration>, result: Result<String, OcrServiceError>) -> Self {
        self.script.get_mut().push_back(Scripted { delay, result });
        self
    }

    /// Number of extraction calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockOcrClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OcrClient for MockOcrClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn extract_text(&self, _image: &ImageData) -> Result<String, OcrServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().await.pop_front();
        match next {
            Some(Scripted { delay, result }) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Ok(self.fixed_response.clone()),
        }
    }
}
