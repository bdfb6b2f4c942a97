//! Positioned words from a PDF text layer.
//!
//! Table reconstruction works on hOCR-style words (text plus a top-left
//! origin bounding box). Pdfium only reports characters, so characters are
//! grouped into words here first.

use super::error::{PdfError, Result};
use html_to_markdown_rs::hocr::HocrWord;
use pdfium_render::prelude::*;

/// Characters further apart than this (PDF units) belong to different words.
const WORD_GAP: f32 = 3.0;

/// Confidence given to words read from a text layer.
const TEXT_LAYER_CONFIDENCE: f64 = 95.0;

/// A character and its box in PDF coordinates (bottom-left origin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharBox {
    pub ch: char,
    pub left: f32,
    pub bottom: f32,
    pub width: f32,
    pub height: f32,
}

/// Extract positioned words from one page.
pub fn extract_words_from_page(page: &PdfPage, min_confidence: f64) -> Result<Vec<HocrWord>> {
    let page_height = page.height().value;
    let text = page
        .text()
        .map_err(|e| PdfError::TextExtractionFailed(format!("Failed to get page text: {}", e)))?;

    let mut chars = Vec::new();
    for pdf_char in text.chars().iter() {
        let Some(ch) = pdf_char.unicode_char() else {
            continue;
        };
        let bounds = pdf_char
            .loose_bounds()
            .map_err(|e| PdfError::TextExtractionFailed(format!("Failed to get char bounds: {}", e)))?;
        chars.push(CharBox {
            ch,
            left: bounds.left().value,
            bottom: bounds.bottom().value,
            width: bounds.width().value,
            height: bounds.height().value,
        });
    }

    Ok(group_chars_into_words(&chars, page_height, min_confidence))
}

/// Group characters into words.
///
/// Whitespace ends a word, as does a jump to another line or a horizontal
/// gap wider than [`WORD_GAP`].
pub fn group_chars_into_words(chars: &[CharBox], page_height: f32, min_confidence: f64) -> Vec<HocrWord> {
    let mut words = Vec::new();
    let mut current: Vec<CharBox> = Vec::new();

    for c in chars {
        if c.ch.is_whitespace() {
            flush(&mut current, &mut words, page_height, min_confidence);
            continue;
        }
        if let Some(last) = current.last()
            && starts_new_word(last, c)
        {
            flush(&mut current, &mut words, page_height, min_confidence);
        }
        current.push(*c);
    }
    flush(&mut current, &mut words, page_height, min_confidence);

    words
}

fn starts_new_word(last: &CharBox, next: &CharBox) -> bool {
    if (next.bottom - last.bottom).abs() > last.height * 0.5 {
        return true;
    }
    next.left - (last.left + last.width) > WORD_GAP
}

fn flush(current: &mut Vec<CharBox>, words: &mut Vec<HocrWord>, page_height: f32, min_confidence: f64) {
    if current.is_empty() {
        return;
    }
    if let Some(word) = to_word(current, page_height, min_confidence) {
        words.push(word);
    }
    current.clear();
}

fn to_word(chars: &[CharBox], page_height: f32, min_confidence: f64) -> Option<HocrWord> {
    if chars.is_empty() || TEXT_LAYER_CONFIDENCE < min_confidence {
        return None;
    }

    let left = chars.iter().map(|c| c.left).fold(f32::INFINITY, f32::min);
    let right = chars.iter().map(|c| c.left + c.width).fold(f32::NEG_INFINITY, f32::max);
    let bottom = chars.iter().map(|c| c.bottom).fold(f32::INFINITY, f32::min);
    let top = chars.iter().map(|c| c.bottom + c.height).fold(f32::NEG_INFINITY, f32::max);

    // hOCR boxes have a top-left origin.
    let top_from_page_top = (page_height - top).round().max(0.0);

    Some(HocrWord {
        text: chars.iter().map(|c| c.ch).collect(),
        left: left.round().max(0.0) as u32,
        top: top_from_page_top as u32,
        width: (right - left).round().max(0.0) as u32,
        height: (top - bottom).round().max(0.0) as u32,
        confidence: TEXT_LAYER_CONFIDENCE,
    })
}
