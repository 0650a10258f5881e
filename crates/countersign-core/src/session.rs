//! Signing session management
//!
//! One session scopes one signer's pass over one document: it partitions the
//! field set by party, holds pending marks locally until save, and gates
//! completion. Pending state lives only inside the session; dropping the
//! session (the signer navigating away) discards it with no document
//! mutation having occurred.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::artwork::{Artwork, DateStamp};
use crate::error::SigningError;
use crate::field::{fields_for, CommittedMark, FieldKind, MarkValue, Party, SignatureField};
use crate::mutator;
use crate::submission::{self, SignedSubmission};

/// Identity of the person signing; attached to the whole submission, not to
/// individual fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerIdentity {
    pub full_name: String,
    pub title: String,
    pub organization: String,
    pub email: String,
}

impl SignerIdentity {
    pub fn validate(&self) -> Result<(), SigningError> {
        let required = [
            ("full name", &self.full_name),
            ("title", &self.title),
            ("organization", &self.organization),
            ("email", &self.email),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(SigningError::InvalidSignerIdentity { field });
            }
        }
        Ok(())
    }
}

/// The value a signer produced for one field, held locally until save.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingValue {
    Artwork(Artwork),
    Date(DateStamp),
}

/// A session-local mark awaiting commitment.
#[derive(Debug, Clone)]
pub struct PendingMark {
    pub field_id: String,
    pub value: PendingValue,
}

/// Per-field signing state as seen from this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    Unsigned,
    PendingLocal,
    Committed,
}

/// One signer's pass over a document's field set.
pub struct SigningSession {
    fields: Vec<SignatureField>,
    acting_party: Party,
    signer: SignerIdentity,
    pending: BTreeMap<String, PendingValue>,
}

impl SigningSession {
    /// Start a session for `acting_party`. The signer identity is validated
    /// up front so a session can never reach save with an unusable identity.
    pub fn new(
        fields: Vec<SignatureField>,
        acting_party: Party,
        signer: SignerIdentity,
    ) -> Result<Self, SigningError> {
        signer.validate()?;
        debug!(
            party = ?acting_party,
            total_fields = fields.len(),
            assigned = fields_for(&fields, acting_party).len(),
            "signing session opened"
        );
        Ok(Self {
            fields,
            acting_party,
            signer,
            pending: BTreeMap::new(),
        })
    }

    pub fn fields(&self) -> &[SignatureField] {
        &self.fields
    }

    pub fn acting_party(&self) -> Party {
        self.acting_party
    }

    /// Fields this signer may act on, in document order.
    pub fn assigned_fields(&self) -> Vec<&SignatureField> {
        fields_for(&self.fields, self.acting_party)
    }

    /// Whether this session may edit the field: assigned to the acting party
    /// and not yet committed. Everything else renders read-only.
    pub fn is_editable(&self, field_id: &str) -> Result<bool, SigningError> {
        let field = self.field(field_id)?;
        Ok(field.assigned_party == self.acting_party && !field.is_signed())
    }

    pub fn state_of(&self, field_id: &str) -> Result<FieldState, SigningError> {
        let field = self.field(field_id)?;
        if field.is_signed() {
            Ok(FieldState::Committed)
        } else if self.pending.contains_key(field_id) {
            Ok(FieldState::PendingLocal)
        } else {
            Ok(FieldState::Unsigned)
        }
    }

    /// Attach a pending mark to a field.
    ///
    /// Authorization is a hard invariant: acting on another party's field is
    /// rejected, never silently ignored, since it would forge that party's
    /// mark. Re-attaching to a field the signer already holds a pending mark
    /// for replaces it (recapture before save); attaching to a committed
    /// field fails.
    pub fn attach(&mut self, field_id: &str, value: PendingValue) -> Result<(), SigningError> {
        let field = self.field(field_id)?;
        if field.assigned_party != self.acting_party {
            return Err(SigningError::UnauthorizedField {
                field_id: field_id.to_string(),
            });
        }
        if field.is_signed() {
            return Err(SigningError::AlreadySigned {
                field_id: field_id.to_string(),
            });
        }
        let kind_matches = matches!(
            (&value, field.kind),
            (PendingValue::Artwork(_), FieldKind::Signature)
                | (PendingValue::Artwork(_), FieldKind::Initials)
                | (PendingValue::Date(_), FieldKind::Date)
        );
        if !kind_matches {
            return Err(SigningError::KindMismatch {
                field_id: field_id.to_string(),
            });
        }

        self.pending.insert(field_id.to_string(), value);
        debug!(field_id, "pending mark attached");
        Ok(())
    }

    /// Reuse pending artwork from one field on another of the same kind —
    /// sign once, apply to every matching field. A convenience only: the
    /// target goes through the same authorization checks as a fresh capture.
    pub fn reuse(&mut self, from_field_id: &str, to_field_id: &str) -> Result<(), SigningError> {
        let from_kind = self.field(from_field_id)?.kind;
        let to_kind = self.field(to_field_id)?.kind;
        if from_kind != to_kind || from_kind == FieldKind::Date {
            return Err(SigningError::KindMismatch {
                field_id: to_field_id.to_string(),
            });
        }
        let value = self
            .pending
            .get(from_field_id)
            .cloned()
            .ok_or_else(|| SigningError::NothingToReuse {
                field_id: from_field_id.to_string(),
            })?;
        self.attach(to_field_id, value)
    }

    /// Assigned fields that are neither committed nor pending.
    pub fn remaining(&self) -> usize {
        self.assigned_fields()
            .iter()
            .filter(|f| !f.is_signed() && !self.pending.contains_key(&f.id))
            .count()
    }

    pub fn can_finalize(&self) -> bool {
        self.remaining() == 0 && !self.pending.is_empty()
    }

    /// Commit the session: embed every pending mark into the document bytes
    /// and package the result for persistence.
    ///
    /// Fails with `IncompleteSigning` (and without ever touching the
    /// document) while any assigned field is still unsigned. On success the
    /// session's own field copies move to `Committed`, so a stray second
    /// save cannot re-embed anything.
    pub fn finalize(&mut self, current_bytes: &[u8]) -> Result<SignedSubmission, SigningError> {
        let missing = self.remaining();
        if missing > 0 {
            return Err(SigningError::IncompleteSigning { missing });
        }
        if self.pending.is_empty() {
            return Err(SigningError::NothingPending);
        }

        // Field order, not map order, so output bytes are stable.
        let marks: Vec<PendingMark> = self
            .fields
            .iter()
            .filter_map(|f| {
                self.pending.get(&f.id).map(|value| PendingMark {
                    field_id: f.id.clone(),
                    value: value.clone(),
                })
            })
            .collect();

        let new_bytes = mutator::mutate(current_bytes, &marks, &self.fields, &self.signer)?;
        let submission = submission::assemble(new_bytes, &self.signer, &marks)?;

        for mark in &marks {
            let value = match &mark.value {
                PendingValue::Artwork(_) => MarkValue::ArtworkRef(mark.field_id.clone()),
                PendingValue::Date(stamp) => MarkValue::DateText(stamp.text.clone()),
            };
            if let Some(field) = self.fields.iter_mut().find(|f| f.id == mark.field_id) {
                field.mark_committed(CommittedMark {
                    value,
                    signer_name: self.signer.full_name.clone(),
                })?;
            }
        }
        self.pending.clear();

        info!(
            party = ?self.acting_party,
            marks = submission.records.len(),
            "signing session committed"
        );
        Ok(submission)
    }

    fn field(&self, field_id: &str) -> Result<&SignatureField, SigningError> {
        self.fields
            .iter()
            .find(|f| f.id == field_id)
            .ok_or_else(|| SigningError::UnknownField {
                field_id: field_id.to_string(),
            })
    }
}
