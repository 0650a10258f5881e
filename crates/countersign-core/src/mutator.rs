//! Additive document mutation
//!
//! Applies a batch of pending marks to a document in one pass: parse, embed
//! every mark in memory, serialize. Existing page content is never rewritten,
//! so marks embedded by earlier signing rounds ride along byte-for-byte in
//! the object store. Any error before serialization yields no output bytes
//! at all, leaving the caller's stored document untouched.

use countersign_pdf::{
    coords::{self, FieldAnchor},
    embed, PdfDocument,
};
use tracing::{debug, info};

use crate::error::SigningError;
use crate::field::SignatureField;
use crate::session::{PendingMark, PendingValue, SignerIdentity};

/// Font size in points for date text drawn natively onto the page.
const DATE_FONT_SIZE: f64 = 14.0;

/// Embed `pending` marks into `current_bytes` and return the new document.
///
/// `fields` must contain an entry for every mark's field id; geometry comes
/// from the field, pixels from the mark. All page references are validated
/// against the parsed document before anything is embedded.
pub fn mutate(
    current_bytes: &[u8],
    pending: &[PendingMark],
    fields: &[SignatureField],
    signer: &SignerIdentity,
) -> Result<Vec<u8>, SigningError> {
    let mut document = PdfDocument::from_bytes(current_bytes.to_vec())?;
    let page_count = document.page_count();

    for mark in pending {
        let field = fields
            .iter()
            .find(|f| f.id == mark.field_id)
            .ok_or_else(|| SigningError::UnknownField {
                field_id: mark.field_id.clone(),
            })?;
        if field.page_number == 0 || field.page_number as usize > page_count {
            return Err(SigningError::InvalidFieldReference {
                field_id: field.id.clone(),
                page: field.page_number,
                page_count,
            });
        }
        apply_mark(&mut document, field, &mark.value)?;
    }

    let bytes = document.save_to_bytes()?;
    info!(
        signer = %signer.full_name,
        marks = pending.len(),
        size = bytes.len(),
        "document mutated"
    );
    Ok(bytes)
}

fn apply_mark(
    document: &mut PdfDocument,
    field: &SignatureField,
    value: &PendingValue,
) -> Result<(), SigningError> {
    let page_size = document.page_size(field.page_number)?;
    let page_id = document
        .page_id(field.page_number)
        .ok_or(SigningError::InvalidFieldReference {
            field_id: field.id.clone(),
            page: field.page_number,
            page_count: document.page_count(),
        })?;
    let anchor = FieldAnchor {
        x_percent: field.x_percent,
        y_percent: field.y_percent,
    };

    match value {
        PendingValue::Artwork(artwork) => {
            let expected = artwork.width as usize * artwork.height as usize * 4;
            if artwork.rgba.len() != expected {
                return Err(SigningError::ArtworkDecode(format!(
                    "field {}: pixel buffer is {} bytes, expected {expected}",
                    field.id,
                    artwork.rgba.len()
                )));
            }
            let placement = coords::place_artwork(
                anchor,
                field.width_percent,
                artwork.width,
                artwork.height,
                page_size,
            );
            debug!(
                field_id = %field.id,
                x = placement.x,
                y = placement.y,
                w = placement.width,
                h = placement.height,
                "embedding artwork"
            );
            embed::embed_image(
                document.doc_mut(),
                page_id,
                &resource_name(&field.id),
                artwork.width,
                artwork.height,
                &artwork.rgba,
                placement,
            )?;
        }
        PendingValue::Date(stamp) => {
            let (x, baseline_y) =
                coords::text_position(anchor, &stamp.text, DATE_FONT_SIZE, page_size);
            debug!(field_id = %field.id, x, baseline_y, "drawing date text");
            embed::draw_text(
                document.doc_mut(),
                page_id,
                &stamp.text,
                x,
                baseline_y,
                DATE_FONT_SIZE,
            )?;
        }
    }
    Ok(())
}

/// XObject resource name for a field's artwork. Derived from the field id so
/// names stay unique across signing rounds; a collision would let a later
/// round's resource dictionary entry shadow an earlier round's mark. Bytes
/// outside `[A-Za-z0-9]` are hex-escaped to keep the name a valid PDF name
/// token.
fn resource_name(field_id: &str) -> String {
    let mut name = String::with_capacity(field_id.len() + 2);
    name.push_str("Mk");
    for byte in field_id.bytes() {
        if byte.is_ascii_alphanumeric() {
            name.push(byte as char);
        } else {
            name.push('_');
            name.push_str(&format!("{byte:02x}"));
        }
    }
    name
}
