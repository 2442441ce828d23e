//! `inkread convert`: upload one image, extract, store.

use std::path::Path;

use anyhow::{bail, Result};

use inkread_media::{ImageAcquirer, SelectedFile};
use inkread_session::{ConversionController, SubmitOutcome};

use crate::terminal_output::{note_success, note_warn};

pub async fn run(controller: &ConversionController, image: &Path, retries: u32) -> Result<()> {
    let file = SelectedFile::from_path(image).await?;
    let mut acquirer = ImageAcquirer::new();
    let image = acquirer.try_accept(file)?;

    let mut outcome = controller.submit_image(image).await;
    let mut attempt = 0;
    while outcome == SubmitOutcome::Unsaved && attempt < retries {
        attempt += 1;
        note_warn(&format!("Save failed, retrying ({attempt}/{retries})"));
        outcome = controller.retry_save().await;
    }

    let snapshot = controller.snapshot().await;
    match outcome {
        SubmitOutcome::Saved(id) => {
            note_success(&format!("Saved conversion {id}"));
            println!("{}", snapshot.current_text());
            Ok(())
        }
        SubmitOutcome::Unsaved => {
            // Still worth showing; the user can copy it by hand.
            println!("{}", snapshot.current_text());
            bail!("{}", snapshot.error_message().unwrap_or("Text extracted but not saved"))
        }
        SubmitOutcome::Failed => {
            bail!("{}", snapshot.error_message().unwrap_or("Failed to process image"))
        }
        SubmitOutcome::Superseded(_) | SubmitOutcome::Ignored => {
            bail!("conversion did not complete")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use inkread_ocr::MockOcrClient;
    use inkread_store::{InMemoryConversionStore, StoreOp};

    fn png_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"\x89PNG\r\n\x1a\n").unwrap();
        file
    }

    #[tokio::test]
    async fn converts_and_stores() {
        let store = Arc::new(InMemoryConversionStore::new());
        let controller = ConversionController::new(
            Arc::new(MockOcrClient::new().with_response("Hello World")),
            store.clone(),
        );
        let file = png_file();

        run(&controller, file.path(), 0).await.unwrap();
        assert_eq!(store.records()[0].extracted_text, "Hello World");
    }

    #[tokio::test]
    async fn retries_failed_save() {
        let store = Arc::new(InMemoryConversionStore::new());
        store.fail_next(StoreOp::Create, 2);
        let controller = ConversionController::new(Arc::new(MockOcrClient::new()), store.clone());
        let file = png_file();

        run(&controller, file.path(), 2).await.unwrap();
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn rejects_non_image() {
        let controller = ConversionController::new(
            Arc::new(MockOcrClient::new()),
            Arc::new(InMemoryConversionStore::new()),
        );
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"plain text").unwrap();

        let err = run(&controller, file.path(), 0).await.unwrap_err();
        assert!(err.to_string().contains("unsupported file type"));
    }
}
