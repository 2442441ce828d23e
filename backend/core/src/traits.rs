use async_trait::async_trait;

use crate::error::{OcrServiceError, StoreError};
use crate::image::ImageData;
use crate::types::{Conversion, ConversionId, ConversionPatch, ListQuery, NewConversion};

/// Remote text extraction.
///
/// One request per call. No retry and no client-side timeout; callers decide
/// whether to try again.
#[async_trait]
pub trait OcrClient: Send + Sync {
    /// Short name used in logs (e.g., "remote", "mock").
    fn name(&self) -> &str;

    /// Extract the handwritten text from an encoded image.
    async fn extract_text(&self, image: &ImageData) -> Result<String, OcrServiceError>;
}

/// CRUD access to the `ocr_conversions` records.
///
/// There are no transactions spanning calls; the session controller sequences
/// create-after-OCR and reconciles its history list itself.
#[async_trait]
pub trait ConversionStore: Send + Sync {
    /// Insert a record and return it with its store-assigned id.
    async fn create(&self, record: NewConversion) -> Result<Conversion, StoreError>;

    /// Apply a save to an existing record.
    async fn update(&self, id: &ConversionId, patch: ConversionPatch) -> Result<(), StoreError>;

    /// Delete a record by id.
    async fn delete(&self, id: &ConversionId) -> Result<(), StoreError>;

    /// List recent records.
    async fn list(&self, query: ListQuery) -> Result<Vec<Conversion>, StoreError>;
}
