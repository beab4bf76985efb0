// Document conversion: uploaded DOCX/PDF/plain text to text, and text back to DOCX/PDF.
// Format handling lives entirely in docx-rs, pdf-extract and printpdf.

pub mod export;
pub mod extract;
pub mod handlers;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Failed to parse file: {0}")]
    Read(String),

    #[error("fmt must be 'docx' or 'pdf' (got '{0}')")]
    UnsupportedFormat(String),

    #[error("Failed to render document: {0}")]
    Render(String),
}

impl DocumentError {
    /// Bad input from the caller, as opposed to a failure on our side.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, DocumentError::Render(_))
    }
}
