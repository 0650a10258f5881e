//! PDF parsing and page inspection using lopdf

use lopdf::{Document, Object, ObjectId};

use crate::coords::PageSize;
use crate::error::PdfError;

/// Wrapper around `lopdf::Document` holding both the parsed object tree and
/// the original bytes it was loaded from.
pub struct PdfDocument {
    doc: Document,
    bytes: Vec<u8>,
}

impl PdfDocument {
    /// Load a PDF from raw bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PdfError> {
        let doc = Document::load_mem(&bytes).map_err(|e| PdfError::Parse(e.to_string()))?;
        Ok(Self { doc, bytes })
    }

    /// The bytes this document was loaded from.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Page object ID for a given page number (1-indexed).
    pub fn page_id(&self, page_num: u32) -> Option<ObjectId> {
        self.doc.get_pages().get(&page_num).copied()
    }

    /// Native page dimensions in points, derived from the MediaBox.
    pub fn page_size(&self, page_num: u32) -> Result<PageSize, PdfError> {
        let page_id = self
            .page_id(page_num)
            .ok_or(PdfError::PageNotFound(page_num))?;

        let page = self
            .doc
            .get_object(page_id)
            .map_err(|e| PdfError::Malformed(format!("failed to get page object: {e}")))?;
        let page_dict = page
            .as_dict()
            .map_err(|_| PdfError::Malformed("page is not a dictionary".into()))?;

        let [_, _, width, height] = self.media_box(page_dict)?;
        Ok(PageSize { width, height })
    }

    /// Extract the MediaBox as `[x, y, width, height]`, traversing to the
    /// parent Pages node when the page inherits it.
    fn media_box(&self, page_dict: &lopdf::Dictionary) -> Result<[f64; 4], PdfError> {
        if let Ok(media_box) = page_dict.get(b"MediaBox") {
            return self.parse_rect(media_box);
        }

        if let Ok(parent_ref) = page_dict.get(b"Parent") {
            if let Ok(parent_id) = parent_ref.as_reference() {
                if let Ok(parent) = self.doc.get_object(parent_id) {
                    if let Ok(parent_dict) = parent.as_dict() {
                        if let Ok(media_box) = parent_dict.get(b"MediaBox") {
                            return self.parse_rect(media_box);
                        }
                    }
                }
            }
        }

        // Default to US Letter size
        Ok([0.0, 0.0, 612.0, 792.0])
    }

    /// Parse a PDF rectangle array into `[x, y, width, height]`.
    fn parse_rect(&self, obj: &Object) -> Result<[f64; 4], PdfError> {
        let arr = match obj {
            Object::Array(a) => a,
            Object::Reference(id) => {
                let resolved = self
                    .doc
                    .get_object(*id)
                    .map_err(|e| PdfError::Malformed(format!("failed to resolve reference: {e}")))?;
                resolved
                    .as_array()
                    .map_err(|_| PdfError::Malformed("MediaBox reference is not an array".into()))?
            }
            _ => return Err(PdfError::Malformed("MediaBox is not an array".into())),
        };

        if arr.len() != 4 {
            return Err(PdfError::Malformed(format!(
                "MediaBox has {} elements, expected 4",
                arr.len()
            )));
        }

        let mut values = [0.0f64; 4];
        for (i, obj) in arr.iter().enumerate() {
            values[i] = self.extract_number(obj)?;
        }

        // Convert from [x1, y1, x2, y2] to [x, y, width, height]
        Ok([
            values[0],
            values[1],
            values[2] - values[0],
            values[3] - values[1],
        ])
    }

    fn extract_number(&self, obj: &Object) -> Result<f64, PdfError> {
        match obj {
            Object::Integer(i) => Ok(*i as f64),
            Object::Real(r) => Ok(*r as f64),
            Object::Reference(id) => {
                let resolved = self
                    .doc
                    .get_object(*id)
                    .map_err(|e| PdfError::Malformed(format!("failed to resolve: {e}")))?;
                self.extract_number(resolved)
            }
            _ => Err(PdfError::Malformed("expected number in rectangle".into())),
        }
    }

    /// Mutable access to the underlying document.
    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Serialize the full document (all pages and objects) to bytes.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, PdfError> {
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| PdfError::Serialize(e.to_string()))?;
        self.bytes = buffer.clone();
        Ok(buffer)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use lopdf::{dictionary, Document, Object};

    /// Build a minimal single-MediaBox document with `pages` pages and
    /// return its serialized bytes.
    pub fn blank_pdf(pages: usize, width: i64, height: i64) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids = Vec::new();
        for _ in 0..pages {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            });
            kids.push(Object::Reference(page_id));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => pages as i64,
                "Kids" => kids,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).expect("save test PDF");
        buffer
    }
}
