use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("Page {0} not found")]
    PageNotFound(u32),

    #[error("Malformed document structure: {0}")]
    Malformed(String),

    #[error("Failed to serialize PDF: {0}")]
    Serialize(String),
}
