//! PDF builders shared by the integration tests.
#![allow(dead_code)]

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

fn finish(mut doc: Document, pages_id: ObjectId, page_contents: Vec<(Vec<u8>, Dictionary)>) -> Vec<u8> {
    let mut kids = Vec::new();
    for (content, resources) in page_contents {
        let content_id = doc.add_object(Object::Stream(Stream::new(Dictionary::new(), content)));
        let mut page = Dictionary::new();
        page.set("Type", name("Page"));
        page.set("Parent", Object::Reference(pages_id));
        page.set("Contents", Object::Reference(content_id));
        page.set("Resources", Object::Dictionary(resources));
        page.set(
            "MediaBox",
            Object::Array([0, 0, 612, 792].into_iter().map(Object::Integer).collect()),
        );
        kids.push(Object::Reference(doc.add_object(Object::Dictionary(page))));
    }

    let mut pages = Dictionary::new();
    pages.set("Type", name("Pages"));
    pages.set("Count", Object::Integer(kids.len() as i64));
    pages.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", name("Catalog"));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// A PDF with one page per entry, each showing its text in Helvetica.
pub fn text_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut font = Dictionary::new();
    font.set("Type", name("Font"));
    font.set("Subtype", name("Type1"));
    font.set("BaseFont", name("Helvetica"));
    font.set("Encoding", name("WinAnsiEncoding"));
    let font_id = doc.add_object(Object::Dictionary(font));

    let contents = pages
        .iter()
        .map(|text| {
            let mut fonts = Dictionary::new();
            fonts.set("F1", Object::Reference(font_id));
            let mut resources = Dictionary::new();
            resources.set("Font", Object::Dictionary(fonts));
            (format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text).into_bytes(), resources)
        })
        .collect();
    finish(doc, pages_id, contents)
}

/// A one-page PDF drawing a single unfiltered 8-bit DeviceRGB image.
///
/// Returns the PDF and the image's object number.
pub fn rgb_image_pdf(width: u32, height: u32, rgb: [u8; 3]) -> (Vec<u8>, u32) {
    let samples: Vec<u8> = rgb.iter().copied().cycle().take((width * height * 3) as usize).collect();

    let mut dict = Dictionary::new();
    dict.set("Type", name("XObject"));
    dict.set("Subtype", name("Image"));
    dict.set("Width", Object::Integer(width as i64));
    dict.set("Height", Object::Integer(height as i64));
    dict.set("ColorSpace", name("DeviceRGB"));
    dict.set("BitsPerComponent", Object::Integer(8));

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let image_id = doc.add_object(Object::Stream(Stream::new(dict, samples)));

    let mut xobjects = Dictionary::new();
    xobjects.set("Im0", Object::Reference(image_id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let content = b"q 100 0 0 100 0 0 cm /Im0 Do Q".to_vec();
    (finish(doc, pages_id, vec![(content, resources)]), image_id.0)
}

pub fn write(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, bytes).unwrap();
}
