//! Table scraping from PDF text layers into a spreadsheet.
//!
//! Each selected page's characters are grouped into positioned words and laid
//! out on a grid by column gaps and row overlap. Tables from all pages are
//! stacked vertically into a single worksheet without a header row.

use crate::core::config::TableScrapeConfig;
use crate::core::io::{read_file_sync, validate_input_file};
use crate::pdf::bindings::pdfium;
use crate::pdf::error::{PdfError, classify_load_error};
use crate::pdf::pages::PageSelection;
use crate::pdf::table::extract_words_from_page;
use crate::spreadsheet::write_rows;
use crate::Result;
use html_to_markdown_rs::hocr::reconstruct_table;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// A table found on one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapedTable {
    /// 1-based page number
    pub page_number: usize,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub output: PathBuf,
    pub pages_scanned: usize,
    pub tables: Vec<ScrapedTable>,
}

impl TableReport {
    pub fn row_count(&self) -> usize {
        self.tables.iter().map(|t| t.rows.len()).sum()
    }
}

/// Stack tables vertically, padding short rows to the widest table.
pub fn concat_tables(tables: &[ScrapedTable]) -> Vec<Vec<String>> {
    let width = tables
        .iter()
        .flat_map(|t| t.rows.iter())
        .map(Vec::len)
        .max()
        .unwrap_or(0);

    tables
        .iter()
        .flat_map(|t| t.rows.iter())
        .map(|row| {
            let mut row = row.clone();
            row.resize(width, String::new());
            row
        })
        .collect()
}

/// Scrape tables from the selected pages of `config.input`.
///
/// Finding no table is not an error: an empty worksheet is written.
///
/// # Errors
///
/// - `FolioError::Validation` for a bad configuration or a page beyond the document
/// - `FolioError::Io` if the input is missing or the output cannot be written
/// - `FolioError::Parsing` if the PDF cannot be opened or its text read
pub fn scrape_tables(config: &TableScrapeConfig) -> Result<TableReport> {
    config.validate()?;
    validate_input_file(&config.input)?;
    let selection = PageSelection::parse(&config.pages)?;

    let bytes = read_file_sync(&config.input)?;
    let pdfium = pdfium(PdfError::TextExtractionFailed, "table scraping")?;
    let document = pdfium
        .load_pdf_from_byte_slice(&bytes, None)
        .map_err(|e| classify_load_error(e.to_string()))?;

    let selected: BTreeSet<usize> = selection
        .resolve(document.pages().len() as usize)?
        .into_iter()
        .collect();

    let mut tables = Vec::new();
    for (index, page) in document.pages().iter().enumerate() {
        if !selected.contains(&index) {
            continue;
        }

        let words = extract_words_from_page(&page, config.min_confidence)?;
        if words.is_empty() {
            tracing::debug!("Page {} has no text", index + 1);
            continue;
        }

        let rows = reconstruct_table(&words, config.column_threshold, config.row_threshold_ratio, true);
        if rows.is_empty() {
            continue;
        }
        tracing::debug!("Page {}: table of {} row(s)", index + 1, rows.len());
        tables.push(ScrapedTable {
            page_number: index + 1,
            rows,
        });
    }

    if tables.is_empty() {
        tracing::warn!("No tables found in {}", config.input.display());
    }

    write_rows(&config.output, None, &concat_tables(&tables))?;

    let report = TableReport {
        output: config.output.clone(),
        pages_scanned: selected.len(),
        tables,
    };
    tracing::info!(
        "Wrote {} table(s), {} row(s) to {}",
        report.tables.len(),
        report.row_count(),
        config.output.display()
    );
    Ok(report)
}
