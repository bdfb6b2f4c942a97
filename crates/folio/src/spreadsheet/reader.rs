//! Workbook reading with `calamine`.
//!
//! Supports `.xlsx`, `.xlsm`, `.xlsb`, `.xls` and `.ods`. Cells are reduced to
//! the few kinds the LaTeX renderer distinguishes.

use crate::core::io::validate_input_file;
use crate::{FolioError, Result};
use calamine::{Data, Range, Reader, open_workbook_auto};
use std::fmt;
use std::path::Path;

/// A cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Number(_))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            // Integral floats print without a fraction, as spreadsheet users typed them
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => f.write_str(if *b { "True" } else { "False" }),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(datetime) => CellValue::Text(datetime.format("%Y-%m-%d %H:%M:%S").to_string()),
                None => CellValue::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Text(format!("#ERR: {:?}", e)),
        }
    }
}

/// One worksheet, as a grid of rows starting at its first used cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

/// Read every worksheet of a workbook, in workbook order.
///
/// # Errors
///
/// - `FolioError::Io` if the file cannot be opened
/// - `FolioError::Parsing` if the format is not recognised or a sheet is corrupt
pub fn read_workbook(path: impl AsRef<Path>) -> Result<Vec<Sheet>> {
    let path = path.as_ref();
    validate_input_file(path)?;

    // Only format errors are wrapped; real I/O errors bubble up unchanged.
    let mut workbook = match open_workbook_auto(path) {
        Ok(wb) => wb,
        Err(calamine::Error::Io(io_err)) => {
            if io_err.kind() == std::io::ErrorKind::InvalidData {
                return Err(FolioError::parsing(format!(
                    "Cannot detect workbook format of {}: {}",
                    path.display(),
                    io_err
                )));
            }
            return Err(io_err.into());
        }
        Err(e) => {
            return Err(FolioError::parsing_with_source(
                format!("Failed to parse workbook {}", path.display()),
                e,
            ));
        }
    };

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name).map_err(|e| {
            FolioError::parsing_with_source(format!("Failed to read sheet '{}'", name), e)
        })?;
        sheets.push(Sheet {
            rows: range_rows(&range),
            name,
        });
    }

    tracing::debug!("Read {} sheet(s) from {}", sheets.len(), path.display());
    Ok(sheets)
}

fn range_rows(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    range
        .rows()
        .map(|row| row.iter().map(CellValue::from).collect())
        .collect()
}
