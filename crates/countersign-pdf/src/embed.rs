//! Additive content embedding
//!
//! Draws signature artwork (as image XObjects with an alpha SMask) and date
//! stamps (as native text) onto existing pages. All operations append new
//! objects and new content streams; existing page content is never read,
//! rewritten, or removed, which is what keeps earlier signers' marks intact
//! across rounds.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;
use tracing::debug;

use crate::coords::Placement;
use crate::error::PdfError;

/// Name under which the date-stamp font is registered in page resources.
/// Re-registering it on a later round writes the same dictionary, so rounds
/// cannot disturb each other through this entry.
const STAMP_FONT_RESOURCE: &str = "CsStampF";

/// Escape special characters for PDF string literals.
fn escape_pdf_string(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '(' => "\\(".to_string(),
            ')' => "\\)".to_string(),
            '\\' => "\\\\".to_string(),
            _ if c.is_ascii() => c.to_string(),
            _ => "?".to_string(),
        })
        .collect()
}

/// Embed RGBA raster artwork on a page at the given placement.
///
/// The pixel buffer is split into a zlib-compressed RGB image stream plus a
/// DeviceGray SMask carrying the alpha channel, registered as an image
/// XObject under `resource_name`. The caller must pick a name that is unique
/// for the lifetime of the document (the signing engine derives it from the
/// field id) so that resources from earlier signing rounds are never
/// shadowed.
pub fn embed_image(
    doc: &mut Document,
    page_id: ObjectId,
    resource_name: &str,
    width: u32,
    height: u32,
    rgba: &[u8],
    placement: Placement,
) -> Result<(), PdfError> {
    if rgba.len() != (width as usize * height as usize * 4) {
        return Err(PdfError::Malformed(format!(
            "RGBA buffer is {} bytes, expected {} for {}x{}",
            rgba.len(),
            width as usize * height as usize * 4,
            width,
            height
        )));
    }

    let mut rgb_buf = Vec::with_capacity(rgba.len() / 4 * 3);
    let mut alpha_buf = Vec::with_capacity(rgba.len() / 4);
    for pixel in rgba.chunks_exact(4) {
        rgb_buf.extend_from_slice(&pixel[..3]);
        alpha_buf.push(pixel[3]);
    }

    let compressed_rgb = zlib_compress(&rgb_buf)?;
    let compressed_alpha = zlib_compress(&alpha_buf)?;

    let smask_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        compressed_alpha,
    ));

    let xobject_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
            "SMask" => Object::Reference(smask_id),
        },
        compressed_rgb,
    ));

    with_page_resources(doc, page_id, |resources| {
        if !resources.has(b"XObject") {
            resources.set("XObject", Object::Dictionary(dictionary! {}));
        }
        let xobjects = resources
            .get_mut(b"XObject")
            .map_err(|_| PdfError::Malformed("page XObject entry is missing".into()))?
            .as_dict_mut()
            .map_err(|_| PdfError::Malformed("page XObject entry is not a dictionary".into()))?;
        xobjects.set(
            resource_name.as_bytes().to_vec(),
            Object::Reference(xobject_id),
        );
        Ok(())
    })?;

    let draw_ops = format!(
        "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
        placement.width, placement.height, placement.x, placement.y, resource_name
    );
    append_content(doc, page_id, draw_ops.into_bytes())?;

    debug!(
        resource = resource_name,
        width, height, "embedded artwork XObject"
    );
    Ok(())
}

/// Draw literal text on a page at a baseline position in page coordinates.
///
/// Uses a Helvetica Type1 font registered in the page resources; native text
/// stays crisp and selectable where rasterized text would not.
pub fn draw_text(
    doc: &mut Document,
    page_id: ObjectId,
    text: &str,
    x: f64,
    baseline_y: f64,
    font_size: f64,
) -> Result<(), PdfError> {
    with_page_resources(doc, page_id, |resources| {
        if !resources.has(b"Font") {
            resources.set("Font", Object::Dictionary(dictionary! {}));
        }
        let fonts = resources
            .get_mut(b"Font")
            .map_err(|_| PdfError::Malformed("page Font entry is missing".into()))?
            .as_dict_mut()
            .map_err(|_| PdfError::Malformed("page Font entry is not a dictionary".into()))?;
        fonts.set(
            STAMP_FONT_RESOURCE,
            Object::Dictionary(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
            }),
        );
        Ok(())
    })?;

    let ops = format!(
        "q\nBT\n/{font} {size} Tf\n0 0 0 rg\n{x} {y} Td\n({text}) Tj\nET\nQ\n",
        font = STAMP_FONT_RESOURCE,
        size = font_size,
        x = x,
        y = baseline_y,
        text = escape_pdf_string(text),
    );
    append_content(doc, page_id, ops.into_bytes())?;

    debug!(text, x, baseline_y, "drew native text stamp");
    Ok(())
}

fn zlib_compress(data: &[u8]) -> Result<Vec<u8>, PdfError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| PdfError::Serialize(format!("zlib compression failed: {e}")))
}

/// Run `f` against the page's Resources dictionary, creating it when absent
/// and following an indirect reference when present.
fn with_page_resources<F>(doc: &mut Document, page_id: ObjectId, f: F) -> Result<(), PdfError>
where
    F: FnOnce(&mut Dictionary) -> Result<(), PdfError>,
{
    let resources_ref = {
        let page = doc
            .get_object(page_id)
            .map_err(|e| PdfError::Malformed(format!("failed to get page object: {e}")))?;
        let page_dict = page
            .as_dict()
            .map_err(|_| PdfError::Malformed("page is not a dictionary".into()))?;
        page_dict
            .get(b"Resources")
            .ok()
            .and_then(|obj| obj.as_reference().ok())
    };

    if let Some(resources_id) = resources_ref {
        let resources = doc
            .get_object_mut(resources_id)
            .map_err(|e| PdfError::Malformed(format!("failed to get resources: {e}")))?
            .as_dict_mut()
            .map_err(|_| PdfError::Malformed("Resources is not a dictionary".into()))?;
        f(resources)
    } else {
        let page = doc
            .get_object_mut(page_id)
            .map_err(|e| PdfError::Malformed(format!("failed to get page object: {e}")))?
            .as_dict_mut()
            .map_err(|_| PdfError::Malformed("page is not a dictionary".into()))?;
        if !page.has(b"Resources") {
            page.set("Resources", Object::Dictionary(dictionary! {}));
        }
        let resources = page
            .get_mut(b"Resources")
            .map_err(|_| PdfError::Malformed("page Resources entry is missing".into()))?
            .as_dict_mut()
            .map_err(|_| PdfError::Malformed("Resources is not a dictionary".into()))?;
        f(resources)
    }
}

/// Append a new content stream to the page's Contents without touching the
/// streams already there. Handles all the shapes Contents may take: an
/// indirect reference, an array of references, a direct stream, or absent.
fn append_content(doc: &mut Document, page_id: ObjectId, ops: Vec<u8>) -> Result<(), PdfError> {
    let stream_id = doc.add_object(Stream::new(dictionary! {}, ops));

    // A direct stream must be hoisted into its own object before it can sit
    // alongside the new stream in an array.
    let existing = {
        let page = doc
            .get_object_mut(page_id)
            .map_err(|e| PdfError::Malformed(format!("failed to get page object: {e}")))?
            .as_dict_mut()
            .map_err(|_| PdfError::Malformed("page is not a dictionary".into()))?;
        page.remove(b"Contents")
    };

    let new_contents = match existing {
        Some(Object::Reference(existing_id)) => Object::Array(vec![
            Object::Reference(existing_id),
            Object::Reference(stream_id),
        ]),
        Some(Object::Array(mut array)) => {
            array.push(Object::Reference(stream_id));
            Object::Array(array)
        }
        Some(direct @ Object::Stream(_)) => {
            let hoisted = doc.add_object(direct);
            Object::Array(vec![Object::Reference(hoisted), Object::Reference(stream_id)])
        }
        _ => Object::Reference(stream_id),
    };

    let page = doc
        .get_object_mut(page_id)
        .map_err(|e| PdfError::Malformed(format!("failed to get page object: {e}")))?
        .as_dict_mut()
        .map_err(|_| PdfError::Malformed("page is not a dictionary".into()))?;
    page.set("Contents", new_contents);
    Ok(())
}
