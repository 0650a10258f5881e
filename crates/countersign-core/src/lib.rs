//! Multi-party document signing engine.
//!
//! The engine takes an authored set of [`SignatureField`]s, runs one
//! [`SigningSession`] per signer, rasterizes captured marks into [`Artwork`],
//! and commits completed sessions by embedding every mark into the PDF bytes
//! additively, so each signing round preserves the marks of all prior
//! rounds.
//!
//! PDF parsing, coordinate mapping, and embedding live in the
//! `countersign-pdf` crate; this crate owns the domain model and the rules.

pub mod artwork;
pub mod error;
pub mod field;
pub mod mutator;
pub mod session;
pub mod submission;

pub use artwork::{
    format_long_date, rasterize_stroke, rasterize_stroke_with_pen, render_date_stamp,
    render_typed, Artwork, DateStamp, StrokePoint, TypeFace,
};
pub use error::SigningError;
pub use field::{
    fields_for, is_fully_signed, CommittedMark, FieldKind, MarkValue, Party, SignatureField,
};
pub use session::{
    FieldState, PendingMark, PendingValue, SignerIdentity, SigningSession,
};
pub use submission::{SignedFieldRecord, SignedSubmission, SignedValue};
