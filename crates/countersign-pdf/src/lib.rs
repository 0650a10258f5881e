//! Shared PDF handling for the signing engine
//!
//! This crate provides PDF parsing, the layout-to-page coordinate
//! transformation, and strictly additive content embedding (signature
//! artwork as image XObjects, date stamps as native text).

pub mod coords;
pub mod embed;
pub mod error;
pub mod parser;

pub use coords::{FieldAnchor, PageSize, Placement};
pub use error::PdfError;
pub use parser::PdfDocument;
