//! The signature-field data model
//!
//! A field is a required mark at a fixed page position, owned by exactly one
//! signing party. Fields are authored before any signing session begins and
//! are never deleted during signing; the only mutation a field ever sees is
//! the one-time attachment of a committed mark.

use serde::{Deserialize, Serialize};

use crate::error::SigningError;

/// A signing party. Compared by value so a typo can never slip through an
/// authorization check the way a free-form role string could.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Party {
    Client,
    Partner,
}

/// What kind of mark a field requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum FieldKind {
    Signature,
    Initials,
    Date,
}

/// The permanently recorded value of a signed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MarkValue {
    /// Storage reference to the embedded artwork.
    ArtworkRef(String),
    /// Literal rendered text, used for date fields.
    DateText(String),
}

/// A mark that a prior signing round embedded into the document. Immutable
/// for the lifetime of the field once set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommittedMark {
    pub value: MarkValue,
    pub signer_name: String,
}

/// A signature requirement placed on a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureField {
    pub id: String,
    /// 1-based page index.
    pub page_number: u32,
    /// Field-center anchor as a percentage (0-100) of page width.
    pub x_percent: f64,
    /// Field-center anchor as a percentage (0-100) of page height.
    pub y_percent: f64,
    /// Bounding-box width as a percentage of page width.
    pub width_percent: f64,
    /// Bounding-box height as a percentage of page height. Display-only:
    /// embedded artwork height follows the artwork's aspect ratio.
    pub height_percent: f64,
    pub kind: FieldKind,
    pub assigned_party: Party,
    pub label: Option<String>,
    committed: Option<CommittedMark>,
}

impl SignatureField {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        page_number: u32,
        x_percent: f64,
        y_percent: f64,
        width_percent: f64,
        height_percent: f64,
        kind: FieldKind,
        assigned_party: Party,
    ) -> Self {
        Self {
            id: id.into(),
            page_number,
            x_percent,
            y_percent,
            width_percent,
            height_percent,
            kind,
            assigned_party,
            label: None,
            committed: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn committed(&self) -> Option<&CommittedMark> {
        self.committed.as_ref()
    }

    pub fn is_signed(&self) -> bool {
        self.committed.is_some()
    }

    /// Record the committed mark for this field. Write-once: a second call
    /// fails, it never replaces an existing mark. Used by the persistence
    /// collaborator when rehydrating fields and by the session on save.
    pub fn mark_committed(&mut self, mark: CommittedMark) -> Result<(), SigningError> {
        if self.committed.is_some() {
            return Err(SigningError::AlreadySigned {
                field_id: self.id.clone(),
            });
        }
        self.committed = Some(mark);
        Ok(())
    }
}

/// Fields assigned to a party, in document order.
pub fn fields_for<'a>(fields: &'a [SignatureField], party: Party) -> Vec<&'a SignatureField> {
    fields
        .iter()
        .filter(|f| f.assigned_party == party)
        .collect()
}

/// True iff every field in the set carries a committed mark.
pub fn is_fully_signed(fields: &[SignatureField]) -> bool {
    fields.iter().all(SignatureField::is_signed)
}
