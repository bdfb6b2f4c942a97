//! Embedded image extraction.
//!
//! Every image XObject referenced from a page's resources is decoded and
//! written as `p{page}-{object}.png`, where `page` is the 0-based page index
//! and `object` the image's PDF object number. Images drawn on several pages
//! are written once per page.
//!
//! Decoding covers the encodings scanned and exported documents actually use:
//! JPEG (`DCTDecode`) and 8-bit samples, either raw or `FlateDecode`d, in
//! gray, RGB, CMYK, ICC-based or indexed colour spaces. CMYK is converted to
//! RGB before writing. Anything else is reported in
//! [`ImageReport::skipped`] and does not stop the run.

use super::error::PdfError;
use super::rendering::encode_png;
use crate::core::config::ImageExtractionConfig;
use crate::core::io::{ensure_output_dir, validate_input_file, write_atomic};
use crate::{FolioError, Result};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use serde::Serialize;
use std::path::PathBuf;

/// Colour space an image was stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceColor {
    Gray,
    Rgb,
    Cmyk,
    Indexed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractedImage {
    pub page_index: usize,
    pub object_number: u32,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub source_color: SourceColor,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedImage {
    pub page_index: usize,
    pub object_number: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageReport {
    pub extracted: Vec<ExtractedImage>,
    pub skipped: Vec<SkippedImage>,
}

/// A decoded image XObject, ready to be encoded.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub source_color: SourceColor,
}

/// Output file name for an image.
pub fn image_file_name(page_index: usize, object_number: u32) -> String {
    format!("p{}-{}.png", page_index, object_number)
}

/// Extract every embedded image of a PDF into `config.output_dir`.
///
/// # Errors
///
/// - `FolioError::Io` if the input is missing or an image cannot be written
/// - `FolioError::Parsing` if the document cannot be loaded
pub fn extract_images(config: &ImageExtractionConfig) -> Result<ImageReport> {
    config.validate()?;
    validate_input_file(&config.input)?;

    let document = Document::load(&config.input).map_err(|e| match e {
        lopdf::Error::IO(io_err) => FolioError::Io(io_err),
        other => PdfError::from(other).into(),
    })?;
    ensure_output_dir(&config.output_dir)?;

    let mut report = ImageReport::default();

    for (page_number, page_id) in document.get_pages() {
        let page_index = page_number as usize - 1;

        for object_id in page_image_ids(&document, page_id) {
            let object_number = object_id.0;
            let decoded = document
                .get_object(object_id)
                .and_then(Object::as_stream)
                .map_err(|e| PdfError::ImageDecodingFailed(e.to_string()))
                .and_then(|stream| decode_image_xobject(&document, stream));

            match decoded {
                Ok(decoded) => {
                    let path = config.output_dir.join(image_file_name(page_index, object_number));
                    let png = encode_png(&decoded.image)?;
                    write_atomic(&path, &png)?;

                    tracing::debug!("Wrote image {} from page {}", path.display(), page_index);
                    report.extracted.push(ExtractedImage {
                        page_index,
                        object_number,
                        path,
                        width: decoded.image.width(),
                        height: decoded.image.height(),
                        source_color: decoded.source_color,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        "Skipping image object {} on page {}: {}",
                        object_number,
                        page_index,
                        err
                    );
                    report.skipped.push(SkippedImage {
                        page_index,
                        object_number,
                        reason: err.to_string(),
                    });
                }
            }
        }
    }

    tracing::info!(
        "Extracted {} image(s), skipped {} from {}",
        report.extracted.len(),
        report.skipped.len(),
        config.input.display()
    );
    Ok(report)
}

/// Follow references until a direct object is reached.
fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    let mut current = object;
    for _ in 0..16 {
        match current {
            Object::Reference(id) => current = doc.get_object(*id).ok()?,
            other => return Some(other),
        }
    }
    None
}

fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, object)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Resources of a page, looking up the page tree when the page has none.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node_id = page_id;
    for _ in 0..32 {
        let node = doc.get_dictionary(node_id).ok()?;
        if let Ok(resources) = node.get(b"Resources") {
            return resolve_dict(doc, resources);
        }
        node_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

/// Object ids of the image XObjects a page references, in resource order.
fn page_image_ids(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let Some(xobjects) = page_resources(doc, page_id)
        .and_then(|resources| resources.get(b"XObject").ok())
        .and_then(|xobjects| resolve_dict(doc, xobjects))
    else {
        return Vec::new();
    };

    let mut ids: Vec<ObjectId> = Vec::new();
    for (_, value) in xobjects.iter() {
        let Ok(id) = value.as_reference() else { continue };
        let is_image = doc
            .get_object(id)
            .and_then(Object::as_stream)
            .ok()
            .and_then(|stream| stream.dict.get(b"Subtype").ok())
            .and_then(|subtype| subtype.as_name().ok())
            == Some(b"Image".as_slice());
        if is_image && !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

fn stream_filters(dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_name().ok().map(|name| name.to_vec()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Colour space of raw samples.
#[derive(Debug, Clone)]
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    Indexed { base: Box<ColorSpace>, palette: Vec<u8> },
}

impl ColorSpace {
    fn components(&self) -> usize {
        match self {
            ColorSpace::Gray | ColorSpace::Indexed { .. } => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
        }
    }

    fn source_color(&self) -> SourceColor {
        match self {
            ColorSpace::Gray => SourceColor::Gray,
            ColorSpace::Rgb => SourceColor::Rgb,
            ColorSpace::Cmyk => SourceColor::Cmyk,
            ColorSpace::Indexed { .. } => SourceColor::Indexed,
        }
    }
}

fn unsupported(message: String) -> PdfError {
    PdfError::ImageDecodingFailed(message)
}

fn parse_color_space(doc: &Document, object: &Object) -> std::result::Result<ColorSpace, PdfError> {
    let object = resolve(doc, object).ok_or_else(|| unsupported("dangling colour space reference".to_string()))?;

    match object {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Ok(ColorSpace::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok(ColorSpace::Rgb),
            b"DeviceCMYK" | b"CMYK" => Ok(ColorSpace::Cmyk),
            other => Err(unsupported(format!(
                "unsupported colour space /{}",
                String::from_utf8_lossy(other)
            ))),
        },
        Object::Array(items) => {
            let family = items
                .first()
                .and_then(|family| family.as_name().ok())
                .ok_or_else(|| unsupported("malformed colour space array".to_string()))?;

            match family {
                b"ICCBased" => {
                    let components = items
                        .get(1)
                        .and_then(|profile| resolve_dict(doc, profile))
                        .and_then(|profile| profile.get(b"N").ok())
                        .and_then(|n| n.as_i64().ok())
                        .ok_or_else(|| unsupported("ICC profile without component count".to_string()))?;
                    match components {
                        1 => Ok(ColorSpace::Gray),
                        3 => Ok(ColorSpace::Rgb),
                        4 => Ok(ColorSpace::Cmyk),
                        n => Err(unsupported(format!("ICC profile with {} components", n))),
                    }
                }
                b"CalGray" => Ok(ColorSpace::Gray),
                b"CalRGB" => Ok(ColorSpace::Rgb),
                b"Indexed" | b"I" => {
                    let base = items
                        .get(1)
                        .ok_or_else(|| unsupported("indexed colour space without base".to_string()))
                        .and_then(|base| parse_color_space(doc, base))?;
                    if matches!(base, ColorSpace::Indexed { .. }) {
                        return Err(unsupported("nested indexed colour space".to_string()));
                    }
                    let palette = items
                        .get(3)
                        .and_then(|lookup| resolve(doc, lookup))
                        .and_then(|lookup| match lookup {
                            Object::String(bytes, _) => Some(bytes.clone()),
                            Object::Stream(stream) => Some(stream_data(stream).ok()?),
                            _ => None,
                        })
                        .ok_or_else(|| unsupported("indexed colour space without lookup table".to_string()))?;
                    Ok(ColorSpace::Indexed {
                        base: Box::new(base),
                        palette,
                    })
                }
                other => Err(unsupported(format!(
                    "unsupported colour space /{}",
                    String::from_utf8_lossy(other)
                ))),
            }
        }
        _ => Err(unsupported("malformed colour space".to_string())),
    }
}

/// Stream bytes with every filter removed.
fn stream_data(stream: &Stream) -> std::result::Result<Vec<u8>, PdfError> {
    if stream_filters(&stream.dict).is_empty() {
        return Ok(stream.content.clone());
    }
    stream
        .decompressed_content()
        .map_err(|e| unsupported(format!("failed to decompress samples: {}", e)))
}

fn dimension(dict: &Dictionary, key: &[u8]) -> std::result::Result<u32, PdfError> {
    let value = dict
        .get(key)
        .and_then(Object::as_i64)
        .map_err(|_| unsupported(format!("missing /{}", String::from_utf8_lossy(key))))?;
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| unsupported(format!("invalid /{} {}", String::from_utf8_lossy(key), value)))
}

/// Convert 8-bit CMYK samples to RGB.
pub fn cmyk_to_rgb(samples: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(samples.len() / 4 * 3);
    for pixel in samples.chunks_exact(4) {
        let k = 255 - pixel[3] as u32;
        for &channel in &pixel[..3] {
            rgb.push(((255 - channel as u32) * k / 255) as u8);
        }
    }
    rgb
}

/// Decode one image XObject stream.
///
/// # Errors
///
/// `PdfError::ImageDecodingFailed` naming the unsupported feature: filter,
/// colour space, bit depth or truncated sample data.
pub fn decode_image_xobject(doc: &Document, stream: &Stream) -> std::result::Result<DecodedImage, PdfError> {
    let dict = &stream.dict;
    let filters = stream_filters(dict);

    if filters.last().map(Vec::as_slice) == Some(b"DCTDecode".as_slice()) {
        if filters.len() > 1 {
            return Err(unsupported("DCTDecode combined with other filters".to_string()));
        }
        let source_color = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|cs| parse_color_space(doc, cs).ok())
            .map(|cs| cs.source_color())
            .unwrap_or(SourceColor::Rgb);

        let image = image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
            .map_err(|e| unsupported(format!("invalid JPEG data: {}", e)))?;
        let image = match image {
            DynamicImage::ImageLuma8(_) => image,
            other => DynamicImage::ImageRgb8(other.into_rgb8()),
        };
        return Ok(DecodedImage { image, source_color });
    }

    if let Some(filter) = filters.iter().find(|f| f.as_slice() != b"FlateDecode") {
        return Err(unsupported(format!(
            "unsupported filter /{}",
            String::from_utf8_lossy(filter)
        )));
    }

    if dict.get(b"ImageMask").and_then(Object::as_bool).unwrap_or(false) {
        return Err(unsupported("stencil masks are not extracted".to_string()));
    }

    let width = dimension(dict, b"Width")?;
    let height = dimension(dict, b"Height")?;
    let bits = dict.get(b"BitsPerComponent").and_then(Object::as_i64).unwrap_or(8);
    if bits != 8 {
        return Err(unsupported(format!("{} bits per component", bits)));
    }

    let color_space = dict
        .get(b"ColorSpace")
        .map_err(|_| unsupported("missing /ColorSpace".to_string()))
        .and_then(|cs| parse_color_space(doc, cs))?;

    let samples = stream_data(stream)?;
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(color_space.components()))
        .ok_or_else(|| unsupported(format!("image dimensions {}x{} overflow", width, height)))?;
    if samples.len() < expected {
        return Err(unsupported(format!(
            "truncated samples: expected {} bytes, found {}",
            expected,
            samples.len()
        )));
    }
    let samples = &samples[..expected];

    let image = samples_to_image(width, height, &color_space, samples)?;
    Ok(DecodedImage {
        image,
        source_color: color_space.source_color(),
    })
}

fn samples_to_image(
    width: u32,
    height: u32,
    color_space: &ColorSpace,
    samples: &[u8],
) -> std::result::Result<DynamicImage, PdfError> {
    let invalid = || unsupported("sample buffer does not match image size".to_string());

    match color_space {
        ColorSpace::Gray => GrayImage::from_raw(width, height, samples.to_vec())
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(invalid),
        ColorSpace::Rgb => RgbImage::from_raw(width, height, samples.to_vec())
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(invalid),
        ColorSpace::Cmyk => RgbImage::from_raw(width, height, cmyk_to_rgb(samples))
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(invalid),
        ColorSpace::Indexed { base, palette } => {
            let entry = base.components();
            let mut expanded = Vec::with_capacity(samples.len() * entry);
            for &index in samples {
                let start = index as usize * entry;
                let color = palette
                    .get(start..start + entry)
                    .ok_or_else(|| unsupported(format!("palette index {} out of range", index)))?;
                expanded.extend_from_slice(color);
            }
            samples_to_image(width, height, base, &expanded)
        }
    }
}
