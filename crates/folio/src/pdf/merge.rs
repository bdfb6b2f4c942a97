//! Page-wise PDF merging.
//!
//! Tesseract emits one small PDF per OCR'd page. They are combined by
//! importing every object of each source with shifted object numbers and
//! pointing a single page tree at all imported pages.

use super::error::{PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Page attributes that may be inherited from ancestor page-tree nodes.
const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Merge PDFs into one document, preserving page order.
///
/// # Errors
///
/// `PdfError::MergeFailed` if `documents` is empty or a document has no page
/// tree; `PdfError::InvalidPdf` if a document cannot be parsed.
pub fn merge_pdf_pages(documents: &[Vec<u8>]) -> Result<Vec<u8>> {
    if documents.is_empty() {
        return Err(PdfError::MergeFailed("No documents to merge".to_string()));
    }

    let mut dest = Document::with_version("1.5");
    let pages_id = dest.new_object_id();
    let mut page_refs: Vec<ObjectId> = Vec::new();

    for (index, bytes) in documents.iter().enumerate() {
        let mut source = Document::load_mem(bytes)
            .map_err(|e| PdfError::InvalidPdf(format!("Failed to load document {}: {}", index, e)))?;

        let source_pages: Vec<ObjectId> = source.get_pages().values().copied().collect();
        if source_pages.is_empty() {
            return Err(PdfError::MergeFailed(format!("Document {} has no pages", index)));
        }
        for &page_id in &source_pages {
            flatten_inherited_attributes(&mut source, page_id);
        }

        let offset = dest.max_id;
        for (old_id, object) in std::mem::take(&mut source.objects) {
            dest.objects.insert((old_id.0 + offset, old_id.1), remap_object_refs(object, offset));
        }
        page_refs.extend(source_pages.iter().map(|id| (id.0 + offset, id.1)));
        dest.max_id = dest.max_id.max(source.max_id + offset);
    }

    for page_id in &page_refs {
        if let Some(Object::Dictionary(page)) = dest.objects.get_mut(page_id) {
            page.set("Parent", Object::Reference(pages_id));
        }
    }

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(page_refs.len() as i64));
    pages.set("Kids", Object::Array(page_refs.iter().copied().map(Object::Reference).collect()));
    dest.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = dest.add_object(Object::Dictionary(catalog));
    dest.trailer.set("Root", Object::Reference(catalog_id));

    // Source catalogs and page-tree nodes are now unreachable.
    dest.prune_objects();
    dest.compress();

    let mut buffer = Vec::new();
    dest.save_to(&mut buffer)
        .map_err(|e| PdfError::MergeFailed(format!("Failed to save merged PDF: {}", e)))?;

    tracing::debug!("Merged {} document(s) into {} page(s)", documents.len(), page_refs.len());
    Ok(buffer)
}

/// Copy attributes a page inherits from its ancestors onto the page itself.
fn flatten_inherited_attributes(doc: &mut Document, page_id: ObjectId) {
    let mut inherited: Vec<(Vec<u8>, Object)> = Vec::new();
    let Ok(page) = doc.get_dictionary(page_id) else {
        return;
    };

    for key in INHERITABLE_ATTRIBUTES {
        if page.has(key) {
            continue;
        }
        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        // Bounded walk guards against cyclic page trees.
        for _ in 0..32 {
            let Some(parent_id) = parent else { break };
            let Ok(node) = doc.get_dictionary(parent_id) else { break };
            if let Ok(value) = node.get(key) {
                inherited.push((key.to_vec(), value.clone()));
                break;
            }
            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        }
    }

    if let Ok(page) = doc.get_dictionary_mut(page_id) {
        for (key, value) in inherited {
            page.set(key, value);
        }
    }
}

fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(items) => Object::Array(items.into_iter().map(|o| remap_object_refs(o, offset)).collect()),
        Object::Dictionary(mut dict) => {
            remap_dictionary(&mut dict, offset);
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            remap_dictionary(&mut stream.dict, offset);
            Object::Stream(stream)
        }
        other => other,
    }
}

fn remap_dictionary(dict: &mut Dictionary, offset: u32) {
    for (_, value) in dict.iter_mut() {
        *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
    }
}
