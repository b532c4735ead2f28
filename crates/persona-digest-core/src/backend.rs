use std::path::Path;

use thiserror::Error;

use crate::Page;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("invalid backend setting {parameter}: {reason}")]
    InvalidSetting {
        parameter: &'static str,
        reason: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::OpenError(_) => "open_failed",
            BackendError::ExtractionError(_) => "extraction_failed",
            BackendError::InvalidSetting { .. } => "invalid_setting",
            BackendError::Io(_) => "io",
        }
    }
}

/// Trait for page-level text extraction backends.
///
/// Implementors turn a document on disk into its ordered pages. Page numbers
/// are 1-based and contiguous; pages without extractable text are still
/// returned (with empty text) so numbering matches the source file. Section
/// detection and ranking live in `persona_digest_analysis`.
pub trait PageExtractor: Send + Sync {
    /// Extract the text of every page of a document, in page order.
    fn extract_pages(&self, path: &Path) -> Result<Vec<Page>, BackendError>;
}
