//! Submission assembly
//!
//! Packages the outcome of a committed signing session for persistence: the
//! mutated document bytes, the signer's identity, and one record per signed
//! field. Artwork travels as encoded PNG so the persistence layer can store
//! each mark as an opaque blob alongside the document.

use serde::{Deserialize, Serialize};

use crate::error::SigningError;
use crate::session::{PendingMark, PendingValue, SignerIdentity};

/// What was recorded for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SignedValue {
    /// PNG-encoded artwork pixels.
    Artwork(Vec<u8>),
    /// Literal text, as drawn onto the page.
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedFieldRecord {
    pub field_id: String,
    pub value: SignedValue,
}

/// Everything the caller needs to persist after a successful save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedSubmission {
    /// The mutated document, ready to replace the stored copy.
    pub document: Vec<u8>,
    pub signer: SignerIdentity,
    pub records: Vec<SignedFieldRecord>,
}

/// Build the submission from the mutated document and the marks that went
/// into it. Records keep the order of `marks` (document field order).
pub fn assemble(
    document: Vec<u8>,
    signer: &SignerIdentity,
    marks: &[PendingMark],
) -> Result<SignedSubmission, SigningError> {
    let mut records = Vec::with_capacity(marks.len());
    for mark in marks {
        let value = match &mark.value {
            PendingValue::Artwork(artwork) => SignedValue::Artwork(artwork.to_png_bytes()?),
            PendingValue::Date(stamp) => SignedValue::Literal(stamp.text.clone()),
        };
        records.push(SignedFieldRecord {
            field_id: mark.field_id.clone(),
            value,
        });
    }
    Ok(SignedSubmission {
        document,
        signer: signer.clone(),
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artwork::{rasterize_stroke, Artwork, DateStamp, StrokePoint};
    use pretty_assertions::assert_eq;

    fn signer() -> SignerIdentity {
        SignerIdentity {
            full_name: "Jane R. Doe".into(),
            title: "Director".into(),
            organization: "Acme Co".into(),
            email: "jane@example.com".into(),
        }
    }

    fn stroke() -> Artwork {
        rasterize_stroke(&[
            StrokePoint { x: 10.0, y: 75.0 },
            StrokePoint { x: 390.0, y: 75.0 },
        ])
        .unwrap()
    }

    #[test]
    fn artwork_records_carry_decodable_png() {
        let artwork = stroke();
        let marks = vec![PendingMark {
            field_id: "sig-1".into(),
            value: PendingValue::Artwork(artwork.clone()),
        }];

        let submission = assemble(vec![1, 2, 3], &signer(), &marks).unwrap();

        assert_eq!(submission.records.len(), 1);
        let SignedValue::Artwork(png) = &submission.records[0].value else {
            panic!("expected artwork record");
        };
        let decoded = Artwork::from_png_bytes(png).unwrap();
        assert_eq!(decoded, artwork);
    }

    #[test]
    fn date_records_carry_the_literal_text() {
        let marks = vec![PendingMark {
            field_id: "date-1".into(),
            value: PendingValue::Date(DateStamp {
                artwork: stroke(),
                text: "March 3, 2026".into(),
            }),
        }];

        let submission = assemble(vec![], &signer(), &marks).unwrap();
        assert_eq!(
            submission.records[0].value,
            SignedValue::Literal("March 3, 2026".into())
        );
    }

    #[test]
    fn serde_round_trip() {
        let marks = vec![
            PendingMark {
                field_id: "sig-1".into(),
                value: PendingValue::Artwork(stroke()),
            },
            PendingMark {
                field_id: "date-1".into(),
                value: PendingValue::Date(DateStamp {
                    artwork: stroke(),
                    text: "March 3, 2026".into(),
                }),
            },
        ];
        let submission = assemble(vec![9, 9], &signer(), &marks).unwrap();

        let json = serde_json::to_string(&submission).unwrap();
        let back: SignedSubmission = serde_json::from_str(&json).unwrap();
        assert_eq!(back.records, submission.records);
        assert_eq!(back.document, submission.document);
        assert_eq!(back.signer.email, "jane@example.com");
    }
}
