//! Self-contained encoded image payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An image carried as a `data:` URL.
///
/// The same string is shown as a preview, sent to the OCR function and stored
/// as the record's `image_url`, so no external reference is ever needed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageData(String);

impl ImageData {
    /// Build from a MIME type and an already base64-encoded payload.
    pub fn from_base64(mime_type: &str, payload: &str) -> Self {
        Self(format!("data:{mime_type};base64,{payload}"))
    }

    /// Wrap a string received from the store or another widget.
    pub fn from_data_url(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_data_url(&self) -> &str {
        &self.0
    }

    /// MIME type declared in the URL header, if this is a `data:` URL.
    pub fn mime_type(&self) -> Option<&str> {
        let rest = self.0.strip_prefix("data:")?;
        let header = rest.split(',').next()?;
        let mime = header.split(';').next()?;
        (!mime.is_empty()).then_some(mime)
    }

    /// The base64 payload after the first comma, or the whole string when
    /// there is no header.
    pub fn payload(&self) -> &str {
        match self.0.split_once(',') {
            Some((_, payload)) => payload,
            None => &self.0,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Payloads run to megabytes; keep Debug output readable.
impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("mime_type", &self.mime_type())
            .field("len", &self.0.len())
            .finish()
    }
}
