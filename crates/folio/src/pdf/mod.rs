//! PDF document processing.
//!
//! Two libraries share the work. `lopdf` handles everything that only needs
//! the object structure: the text layer for the keyword search, embedded
//! image XObjects and page-wise merging of OCR output. `pdfium-render` is
//! used where layout matters: rasterizing pages for OCR and character
//! positions for table scraping.
//!
//! Pdfium is bound lazily on first use, from `FOLIO_PDFIUM_PATH` when set or
//! the system library path otherwise.
pub mod bindings;
pub mod error;
pub mod images;
pub mod merge;
pub mod pages;
pub mod rendering;
pub mod table;
pub mod text;

#[cfg(test)]
pub(crate) mod testing;

pub use bindings::pdfium_available;
pub use error::PdfError;
pub use images::{ExtractedImage, ImageReport, SkippedImage, SourceColor, cmyk_to_rgb, decode_image_xobject, extract_images};
pub use merge::merge_pdf_pages;
pub use pages::{PageRange, PageSelection, parse_page_selection};
pub use rendering::{PdfRenderer, RenderSize, render_pages_to_png};
pub use table::extract_words_from_page;
pub use text::{LopdfTextExtractor, PdfiumTextExtractor, TextExtractor};
