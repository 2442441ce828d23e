use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::image::ImageData;

/// Number of recent conversions kept in the history list.
pub const HISTORY_LIMIT: usize = 50;

/// Opaque identifier assigned by the store on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversionId(String);

impl ConversionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A stored handwriting conversion, as the `ocr_conversions` resource returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub id: ConversionId,
    /// Original upload; immutable after creation.
    #[serde(rename = "image_url")]
    pub image_source: ImageData,
    /// OCR output at creation time; immutable after creation.
    pub extracted_text: String,
    /// Present only after an explicit save.
    #[serde(default)]
    pub edited_text: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Conversion {
    /// Edited text wins over extracted text once it exists.
    pub fn display_text(&self) -> &str {
        self.edited_text.as_deref().unwrap_or(&self.extracted_text)
    }

    pub fn is_edited(&self) -> bool {
        self.edited_text.is_some()
    }
}

/// Insert payload for a fresh conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewConversion {
    pub image_url: ImageData,
    pub extracted_text: String,
}

/// Fields written by a save.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionPatch {
    pub edited_text: String,
    pub updated_at: DateTime<Utc>,
}

impl ConversionPatch {
    pub fn edited_now(text: impl Into<String>) -> Self {
        Self {
            edited_text: text.into(),
            updated_at: Utc::now(),
        }
    }
}

/// Parameters of a history listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: usize,
    /// Order by `created_at` descending.
    pub newest_first: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: HISTORY_LIMIT,
            newest_first: true,
        }
    }
}
