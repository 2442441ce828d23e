use thiserror::Error;

/// Failure of the remote text-extraction call.
#[derive(Debug, Error)]
pub enum OcrServiceError {
    /// The service answered with a non-2xx status.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("malformed OCR response: {0}")]
    MalformedResponse(String),

    #[error("OCR request failed: {0}")]
    Transport(String),
}

/// Failure of a conversion store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(String),

    #[error("store returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed store response: {0}")]
    MalformedResponse(String),

    #[error("conversion not found: {0}")]
    NotFound(String),
}

/// Rejected image input. Callers drop these silently.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("unsupported file type '{0}', expected image/*")]
    UnsupportedType(String),

    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid or incomplete runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting '{0}'")]
    Missing(String),

    #[error("invalid setting '{path}': {message}")]
    Invalid { path: String, message: String },
}
