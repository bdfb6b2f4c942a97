//! Plain-text extraction used by the keyword search.
//!
//! The search only needs to know whether a pattern occurs somewhere in a
//! document, so extraction goes through the small [`TextExtractor`] seam. The
//! default implementation reads the text layer with `lopdf` and needs no
//! native library; [`PdfiumTextExtractor`] uses pdfium's layout-aware text
//! instead.

use super::bindings::pdfium;
use super::error::{PdfError, classify_load_error};
use crate::{FolioError, Result};
use lopdf::Document;
use pdfium_render::prelude::*;
use std::path::Path;

/// Source of plain text for one document.
pub trait TextExtractor {
    /// Extract the full plain text of the document at `path`.
    ///
    /// Any error is treated by the search as "this document is skipped".
    fn extract_text(&self, path: &Path) -> Result<String>;
}

/// Text layer extraction with `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfTextExtractor {
    /// Only read the first N pages (None = every page)
    pub max_pages: Option<u32>,
}

impl LopdfTextExtractor {
    pub fn new(max_pages: Option<u32>) -> Self {
        Self { max_pages }
    }

    /// Extract text from an in-memory PDF.
    pub fn extract_text_from_bytes(&self, pdf_bytes: &[u8]) -> Result<String> {
        let document = Document::load_mem(pdf_bytes).map_err(map_lopdf_error)?;
        self.extract_from_document(&document)
    }

    fn extract_from_document(&self, document: &Document) -> Result<String> {
        let limit = self.max_pages.map(|n| n as usize).unwrap_or(usize::MAX);
        let page_numbers: Vec<u32> = document.get_pages().keys().copied().take(limit).collect();

        if page_numbers.is_empty() {
            return Ok(String::new());
        }

        document
            .extract_text(&page_numbers)
            .map_err(|e| PdfError::TextExtractionFailed(e.to_string()).into())
    }
}

impl TextExtractor for LopdfTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String> {
        let document = Document::load(path).map_err(map_lopdf_error)?;
        self.extract_from_document(&document)
    }
}

fn map_lopdf_error(err: lopdf::Error) -> FolioError {
    match err {
        lopdf::Error::IO(io_err) => FolioError::Io(io_err),
        other => PdfError::from(other).into(),
    }
}

/// Text extraction through pdfium.
pub struct PdfiumTextExtractor {
    pdfium: Pdfium,
    max_pages: Option<u32>,
}

impl PdfiumTextExtractor {
    pub fn new(max_pages: Option<u32>) -> Result<Self> {
        let pdfium = pdfium(PdfError::TextExtractionFailed, "text extraction")?;
        Ok(Self { pdfium, max_pages })
    }
}

impl TextExtractor for PdfiumTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)?;
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(&bytes, None)
            .map_err(|e| classify_load_error(e.to_string()))?;

        let limit = self.max_pages.map(|n| n as usize).unwrap_or(usize::MAX);
        let mut content = String::new();

        for page in document.pages().iter().take(limit) {
            let text = page
                .text()
                .map_err(|e| PdfError::TextExtractionFailed(format!("Failed to get page text: {}", e)))?;
            if !content.is_empty() {
                content.push('\n');
            }
            content.push_str(&text.all());
        }

        Ok(content)
    }
}
