//! Text Review
//!
//! Editable copy of the current display text with copy, export and save.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, info};

use inkread_session::{ConversionController, SaveOutcome};

/// How long the "copied" acknowledgement stays up.
pub const COPY_ACK: Duration = Duration::from_secs(2);

pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> anyhow::Result<()>;
}

/// Clipboard that keeps the last written text in memory.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> anyhow::Result<()> {
        *self.contents.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.to_string());
        Ok(())
    }
}

/// `ocr-text-<unix millis>.txt`
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("ocr-text-{}.txt", at.timestamp_millis())
}

#[derive(Debug, Default)]
pub struct TextReview {
    loaded: String,
    buffer: String,
    copied_at: Option<Instant>,
}

impl TextReview {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow the controller's display text. A change discards local edits.
    pub fn sync(&mut self, display_text: &str) {
        if self.loaded != display_text {
            self.loaded = display_text.to_string();
            self.buffer = display_text.to_string();
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn edit(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    pub fn is_dirty(&self) -> bool {
        self.buffer != self.loaded
    }

    pub fn can_save(&self, is_saving: bool) -> bool {
        !is_saving && self.is_dirty()
    }

    pub fn copy(&mut self, clipboard: &dyn Clipboard) -> anyhow::Result<()> {
        clipboard.write_text(&self.buffer)?;
        self.copied_at = Some(Instant::now());
        Ok(())
    }

    pub fn is_copied(&self) -> bool {
        self.copied_at
            .is_some_and(|at| at.elapsed() < COPY_ACK)
    }

    /// Write the buffer to a fresh file in `dir` and return its path.
    pub async fn export(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(export_file_name(Utc::now()));
        tokio::fs::write(&path, self.buffer.as_bytes()).await?;
        info!(path = %path.display(), chars = self.buffer.chars().count(), "Text exported");
        Ok(path)
    }

    /// Send the buffer to the controller if the save button would be enabled.
    pub async fn save(&self, controller: &ConversionController) -> Option<SaveOutcome> {
        let is_saving = controller.snapshot().await.is_saving;
        if !self.can_save(is_saving) {
            debug!(is_saving, dirty = self.is_dirty(), "Save not available");
            return None;
        }
        Some(controller.save_edits(self.buffer.clone()).await)
    }
}
