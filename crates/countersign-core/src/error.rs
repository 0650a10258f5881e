use countersign_pdf::PdfError;
use thiserror::Error;

/// Error taxonomy for the signing engine.
///
/// Every variant is surfaced synchronously and is non-retryable without
/// changed input; none represents a transient condition, so callers should
/// not build retry loops around these.
#[derive(Error, Debug)]
pub enum SigningError {
    #[error("Capture produced no usable artwork")]
    EmptyInput,

    #[error("Field {field_id} is not assigned to the acting party")]
    UnauthorizedField { field_id: String },

    #[error("Field {field_id} has already been signed")]
    AlreadySigned { field_id: String },

    #[error("Unknown field: {field_id}")]
    UnknownField { field_id: String },

    #[error("Mark value does not match the kind of field {field_id}")]
    KindMismatch { field_id: String },

    #[error("No pending artwork to reuse from field {field_id}")]
    NothingToReuse { field_id: String },

    #[error("Signer {field} must not be empty")]
    InvalidSignerIdentity { field: &'static str },

    #[error("Please sign all {missing} remaining field(s)")]
    IncompleteSigning { missing: usize },

    #[error("Session has no pending marks to commit")]
    NothingPending,

    #[error("Failed to parse document: {0}")]
    DocumentParse(String),

    #[error("Field {field_id} references page {page}, but the document has {page_count} page(s)")]
    InvalidFieldReference {
        field_id: String,
        page: u32,
        page_count: usize,
    },

    #[error("Failed to decode artwork: {0}")]
    ArtworkDecode(String),
}

impl From<PdfError> for SigningError {
    fn from(err: PdfError) -> Self {
        match err {
            PdfError::Parse(msg) => SigningError::DocumentParse(msg),
            // The mutator validates page references itself; a residual
            // PageNotFound from the PDF layer still maps to a parse-level
            // integrity failure rather than silently succeeding.
            other => SigningError::DocumentParse(other.to_string()),
        }
    }
}
