use super::bindings::pdfium;
use super::error::{PdfError, Result, classify_load_error};
use image::{DynamicImage, ImageFormat};
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

const PDF_POINTS_PER_INCH: f64 = 72.0;

/// Raster size of a rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RenderSize {
    /// Every page rendered to exactly this many pixels
    Fixed { width: u32, height: u32 },
    /// Size follows from the page's dimensions at this resolution
    Dpi(u32),
}

impl RenderSize {
    /// Pixel dimensions for a page of `width_points` x `height_points`.
    pub fn pixels(&self, width_points: f32, height_points: f32) -> (i32, i32) {
        match *self {
            RenderSize::Fixed { width, height } => (width.max(1) as i32, height.max(1) as i32),
            RenderSize::Dpi(dpi) => {
                let scale = dpi as f64 / PDF_POINTS_PER_INCH;
                (
                    ((width_points as f64 * scale) as i32).max(1),
                    ((height_points as f64 * scale) as i32).max(1),
                )
            }
        }
    }
}

pub struct PdfRenderer {
    pdfium: Pdfium,
}

impl PdfRenderer {
    pub fn new() -> Result<Self> {
        let pdfium = pdfium(PdfError::RenderingFailed, "page rendering")?;
        Ok(Self { pdfium })
    }

    fn load<'a>(&'a self, pdf_bytes: &'a [u8]) -> Result<PdfDocument<'a>> {
        self.pdfium
            .load_pdf_from_byte_slice(pdf_bytes, None)
            .map_err(|e| classify_load_error(e.to_string()))
    }

    pub fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize> {
        Ok(self.load(pdf_bytes)?.pages().len() as usize)
    }

    /// Render every page, in order.
    pub fn render_all_pages(&self, pdf_bytes: &[u8], size: RenderSize) -> Result<Vec<DynamicImage>> {
        let document = self.load(pdf_bytes)?;
        let mut images = Vec::with_capacity(document.pages().len() as usize);

        for (index, page) in document.pages().iter().enumerate() {
            images.push(render_page(&page, size).map_err(|e| match e {
                PdfError::RenderingFailed(msg) => PdfError::RenderingFailed(format!("page {}: {}", index + 1, msg)),
                other => other,
            })?);
        }
        Ok(images)
    }
}

fn render_page(page: &PdfPage, size: RenderSize) -> Result<DynamicImage> {
    let (width, height) = size.pixels(page.width().value, page.height().value);

    let config = PdfRenderConfig::new()
        .set_target_width(width)
        .set_target_height(height)
        .rotate_if_landscape(PdfPageRenderRotation::None, false);

    let bitmap = page
        .render_with_config(&config)
        .map_err(|e| PdfError::RenderingFailed(format!("Failed to render page: {}", e)))?;

    Ok(DynamicImage::ImageRgb8(bitmap.as_image().into_rgb8()))
}

/// Encode an image as PNG.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| PdfError::RenderingFailed(format!("Failed to encode PNG: {}", e)))?;
    Ok(buffer.into_inner())
}

/// Rasterize every page of a PDF and encode each as PNG.
pub fn render_pages_to_png(pdf_bytes: &[u8], size: RenderSize) -> Result<Vec<Vec<u8>>> {
    let renderer = PdfRenderer::new()?;
    renderer
        .render_all_pages(pdf_bytes, size)?
        .iter()
        .map(encode_png)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::bindings::pdfium_available;
    use crate::pdf::testing::text_pdf;

    #[test]
    fn test_fixed_size_ignores_page_dimensions() {
        let size = RenderSize::Fixed {
            width: 1654,
            height: 2340,
        };
        assert_eq!(size.pixels(612.0, 792.0), (1654, 2340));
        assert_eq!(size.pixels(10.0, 10.0), (1654, 2340));
    }

    #[test]
    fn test_dpi_size_scales_points() {
        assert_eq!(RenderSize::Dpi(72).pixels(612.0, 792.0), (612, 792));
        assert_eq!(RenderSize::Dpi(144).pixels(612.0, 792.0), (1224, 1584));
        assert_eq!(RenderSize::Dpi(1).pixels(10.0, 10.0), (1, 1));
    }

    #[test]
    fn test_encode_png_signature() {
        let image = DynamicImage::new_rgb8(4, 3);
        let png = encode_png(&image).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_render_invalid_pdf() {
        if !pdfium_available() {
            return;
        }
        let err = render_pages_to_png(b"not a pdf", RenderSize::Dpi(72)).unwrap_err();
        assert!(matches!(err, PdfError::InvalidPdf(_)));
    }

    #[test]
    fn test_render_pages_to_png() {
        if !pdfium_available() {
            return;
        }
        let pdf = text_pdf(&["one", "two"]);
        let pages = render_pages_to_png(&pdf, RenderSize::Fixed { width: 200, height: 300 }).unwrap();
        assert_eq!(pages.len(), 2);

        let decoded = image::load_from_memory(&pages[1]).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 300));
    }
}
