pub mod error;
pub mod image;
pub mod traits;
pub mod types;

pub use error::{AcquisitionError, ConfigError, OcrServiceError, StoreError};
pub use image::ImageData;
pub use traits::{ConversionStore, OcrClient};
pub use types::{
    Conversion, ConversionId, ConversionPatch, ListQuery, NewConversion, HISTORY_LIMIT,
};
