use std::fmt;

use inkread_core::{ConversionId, ImageData};

/// Tag of one `submit_image` / `retry_save` call. Only the newest may still
/// change the session when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(pub(crate) u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where the current conversion stands.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// Nothing loaded.
    Idle,
    /// OCR, then the store create, in flight. `text` is set once OCR returned.
    Processing {
        request: RequestToken,
        image: ImageData,
        text: Option<String>,
    },
    /// A stored conversion is current, either fresh or selected from history.
    Extracted {
        id: ConversionId,
        image: ImageData,
        text: String,
    },
    /// OCR succeeded but the record could not be created.
    Unsaved { image: ImageData, text: String },
    /// OCR failed. The image stays on screen next to the error.
    Failed { image: ImageData },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Processing { .. } => "processing",
            Phase::Extracted { .. } => "extracted",
            Phase::Unsaved { .. } => "unsaved",
            Phase::Failed { .. } => "failed",
        }
    }

    pub fn current_image(&self) -> Option<&ImageData> {
        match self {
            Phase::Idle => None,
            Phase::Processing { image, .. }
            | Phase::Extracted { image, .. }
            | Phase::Unsaved { image, .. }
            | Phase::Failed { image } => Some(image),
        }
    }

    pub fn current_text(&self) -> &str {
        match self {
            Phase::Processing { text: Some(text), .. }
            | Phase::Extracted { text, .. }
            | Phase::Unsaved { text, .. } => text,
            _ => "",
        }
    }

    /// Only a stored conversion has an id.
    pub fn conversion_id(&self) -> Option<&ConversionId> {
        match self {
            Phase::Extracted { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, Phase::Processing { .. })
    }

    pub(crate) fn is_request(&self, token: RequestToken) -> bool {
        matches!(self, Phase::Processing { request, .. } if *request == token)
    }
}
