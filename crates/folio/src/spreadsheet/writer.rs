use crate::core::io::write_atomic;
use crate::{FolioError, Result};
use rust_xlsxwriter::Workbook;
use std::path::Path;

const SHEET_NAME: &str = "Sheet1";
const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

/// Build a single-sheet workbook in memory.
///
/// `header`, when given, becomes the first row. Every cell is written as a
/// string; callers decide how values are rendered.
pub fn rows_to_xlsx(header: Option<&[&str]>, rows: &[Vec<String>]) -> Result<Vec<u8>> {
    let header_rows = usize::from(header.is_some());
    if rows.len() + header_rows > MAX_ROWS {
        return Err(FolioError::validation(format!(
            "{} rows exceed the worksheet limit of {}",
            rows.len() + header_rows,
            MAX_ROWS
        )));
    }
    let widest = rows
        .iter()
        .map(Vec::len)
        .chain(header.map(<[&str]>::len))
        .max()
        .unwrap_or(0);
    if widest > MAX_COLUMNS {
        return Err(FolioError::validation(format!(
            "{} columns exceed the worksheet limit of {}",
            widest, MAX_COLUMNS
        )));
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    if let Some(header) = header {
        for (col, title) in header.iter().enumerate() {
            worksheet.write_string(0, col as u16, *title)?;
        }
    }

    for (index, row) in rows.iter().enumerate() {
        let row_number = (index + header_rows) as u32;
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(row_number, col as u16, value)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Write a single-sheet workbook to `path` atomically.
///
/// The parent directory must exist; nothing is written if any step fails.
pub fn write_rows(path: impl AsRef<Path>, header: Option<&[&str]>, rows: &[Vec<String>]) -> Result<()> {
    let path = path.as_ref();
    let bytes = rows_to_xlsx(header, rows)?;
    write_atomic(path, &bytes)?;

    tracing::debug!("Wrote {} row(s) to {}", rows.len(), path.display());
    Ok(())
}
