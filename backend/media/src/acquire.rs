use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use tracing::debug;

use inkread_core::{AcquisitionError, ImageData};

use crate::mime_detect::{detect_mime_type, is_image, sniff_image_type};

/// A file handed over by a picker or a drop.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, typing it by extension and then by content.
    pub async fn from_path(path: &Path) -> Result<Self, AcquisitionError> {
        let data = tokio::fs::read(path).await?;
        let mut mime_type = detect_mime_type(path);
        if !is_image(mime_type) {
            if let Some(sniffed) = sniff_image_type(&data) {
                mime_type = sniffed;
            }
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, mime_type, data))
    }
}

/// Encode raw bytes into a self-contained `data:` URL.
pub fn encode_image(mime_type: &str, data: &[u8]) -> ImageData {
    ImageData::from_base64(mime_type, &STANDARD.encode(data))
}

/// The picker / drop zone. Keeps its own preview until a new image replaces it.
#[derive(Debug, Default)]
pub struct ImageAcquirer {
    preview: Option<ImageData>,
    dragging: bool,
}

impl ImageAcquirer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preview(&self) -> Option<&ImageData> {
        self.preview.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Validate and encode a file, replacing the preview on success.
    pub fn try_accept(&mut self, file: SelectedFile) -> Result<ImageData, AcquisitionError> {
        if !is_image(&file.mime_type) {
            return Err(AcquisitionError::UnsupportedType(file.mime_type));
        }
        let image = encode_image(&file.mime_type, &file.data);
        debug!(name = %file.name, mime = %file.mime_type, bytes = file.data.len(), "Image accepted");
        self.preview = Some(image.clone());
        Ok(image)
    }

    /// Like [`try_accept`](Self::try_accept), but non-image input is ignored.
    pub fn accept(&mut self, file: SelectedFile) -> Option<ImageData> {
        match self.try_accept(file) {
            Ok(image) => Some(image),
            Err(e) => {
                debug!(error = %e, "Ignoring dropped input");
                None
            }
        }
    }

    pub fn drag_over(&mut self) {
        self.dragging = true;
    }

    pub fn drag_leave(&mut self) {
        self.dragging = false;
    }

    /// Only the first dropped file is considered.
    pub fn drop_files(&mut self, files: Vec<SelectedFile>) -> Option<ImageData> {
        self.dragging = false;
        let file = files.into_iter().next()?;
        self.accept(file)
    }

    /// Remove the preview. Not allowed while the image is being processed.
    pub fn clear(&mut self, is_processing: bool) -> bool {
        if is_processing {
            return false;
        }
        self.preview = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn png(name: &str) -> SelectedFile {
        SelectedFile::new(name, "image/png", &b"\x89PNG\r\n\x1a\n"[..])
    }

    #[test]
    fn accepts_image_and_sets_preview() {
        let mut acquirer = ImageAcquirer::new();
        let image = acquirer.accept(png("note.png")).unwrap();
        assert_eq!(image.mime_type(), Some("image/png"));
        assert_eq!(image.payload(), "iVBORw0KGgo=");
        assert_eq!(acquirer.preview(), Some(&image));
    }

    #[test]
    fn ignores_non_image_input() {
        let mut acquirer = ImageAcquirer::new();
        acquirer.accept(png("first.png")).unwrap();
        let pdf = SelectedFile::new("doc.pdf", "application/pdf", &b"%PDF"[..]);

        assert!(acquirer.accept(pdf.clone()).is_none());
        assert!(matches!(
            acquirer.try_accept(pdf),
            Err(AcquisitionError::UnsupportedType(_))
        ));
        // Previous preview survives a rejected input.
        assert!(acquirer.preview().is_some());
    }

    #[test]
    fn drop_takes_first_file_and_ends_drag() {
        let mut acquirer = ImageAcquirer::new();
        acquirer.drag_over();
        assert!(acquirer.is_dragging());

        let text = SelectedFile::new("a.txt", "text/plain", &b"hi"[..]);
        let image = acquirer.drop_files(vec![png("b.png"), text]);
        assert!(image.is_some());
        assert!(!acquirer.is_dragging());
    }

    #[test]
    fn empty_drop_is_ignored() {
        let mut acquirer = ImageAcquirer::new();
        acquirer.drag_over();
        assert!(acquirer.drop_files(Vec::new()).is_none());
        assert!(!acquirer.is_dragging());
    }

    #[test]
    fn clear_is_blocked_while_processing() {
        let mut acquirer = ImageAcquirer::new();
        acquirer.accept(png("n.png"));
        assert!(!acquirer.clear(true));
        assert!(acquirer.preview().is_some());
        assert!(acquirer.clear(false));
        assert!(acquirer.preview().is_none());
    }

    #[tokio::test]
    async fn reads_file_and_sniffs_unknown_extension() {
        let mut file = tempfile::Builder::new().suffix(".upload").tempfile().unwrap();
        file.write_all(b"\xFF\xD8\xFF\xE0rest").unwrap();

        let selected = SelectedFile::from_path(file.path()).await.unwrap();
        assert_eq!(selected.mime_type, "image/jpeg");
        assert!(selected.name.ends_with(".upload"));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = SelectedFile::from_path(Path::new("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AcquisitionError::Io(_)));
    }
}
