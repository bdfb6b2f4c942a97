//! Small PDF builders for unit tests.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

fn helvetica() -> Dictionary {
    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    font
}

fn finish(mut doc: Document, pages_id: ObjectId, page_ids: Vec<ObjectId>) -> Vec<u8> {
    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(page_ids.len() as i64));
    pages.set(
        "Kids",
        Object::Array(page_ids.into_iter().map(Object::Reference).collect()),
    );
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    doc.objects.insert(catalog_id, Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn add_page(doc: &mut Document, pages_id: ObjectId, content: String, resources: Dictionary) -> ObjectId {
    let content_id = doc.add_object(Object::Stream(Stream::new(Dictionary::new(), content.into_bytes())));

    let mut page = Dictionary::new();
    page.set("Type", Object::Name(b"Page".to_vec()));
    page.set("Parent", Object::Reference(pages_id));
    page.set("Contents", Object::Reference(content_id));
    page.set("Resources", Object::Dictionary(resources));
    page.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ]),
    );
    doc.add_object(Object::Dictionary(page))
}

/// One page per entry, each showing its text in Helvetica.
pub(crate) fn text_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(Object::Dictionary(helvetica()));

    let page_ids = pages
        .iter()
        .map(|text| {
            let mut fonts = Dictionary::new();
            fonts.set("F1", Object::Reference(font_id));
            let mut resources = Dictionary::new();
            resources.set("Font", Object::Dictionary(fonts));

            let content = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text);
            add_page(&mut doc, pages_id, content, resources)
        })
        .collect();

    finish(doc, pages_id, page_ids)
}

/// One page drawing every given image XObject.
///
/// Returns the PDF bytes and the object numbers of the image streams.
pub(crate) fn image_pdf(images: Vec<Stream>) -> (Vec<u8>, Vec<u32>) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut xobjects = Dictionary::new();
    let mut object_numbers = Vec::new();
    let mut content = String::new();
    for (index, image) in images.into_iter().enumerate() {
        let id = doc.add_object(Object::Stream(image));
        let name = format!("Im{}", index);
        xobjects.set(name.as_bytes().to_vec(), Object::Reference(id));
        object_numbers.push(id.0);
        content.push_str(&format!("q 100 0 0 100 0 0 cm /{} Do Q\n", name));
    }

    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));
    let page_id = add_page(&mut doc, pages_id, content, resources);

    (finish(doc, pages_id, vec![page_id]), object_numbers)
}

/// Image XObject stream with raw (unfiltered) samples.
pub(crate) fn raw_image(width: i64, height: i64, color_space: Object, bits: i64, samples: Vec<u8>) -> Stream {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(width));
    dict.set("Height", Object::Integer(height));
    dict.set("ColorSpace", color_space);
    dict.set("BitsPerComponent", Object::Integer(bits));
    Stream::new(dict, samples).with_compression(false)
}
