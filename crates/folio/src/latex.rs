//! Spreadsheet sheets to LaTeX `booktabs` tables.
//!
//! Every worksheet of a workbook becomes one `table` float written to
//! `<output_dir>/<workbook stem>_<sheet>.txt`. The first row of a sheet is the
//! header; a column whose data cells are all numbers is right aligned.

use crate::core::config::LatexConfig;
use crate::core::io::{ensure_output_dir, write_atomic};
use crate::spreadsheet::{CellValue, Sheet, read_workbook};
use crate::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A sheet reshaped for rendering: strings padded to a common width.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// One of `l` or `r` per column.
    pub alignments: Vec<char>,
}

impl SheetTable {
    pub fn column_count(&self) -> usize {
        self.alignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.column_count() == 0
    }
}

fn column_alignment(rows: &[Vec<CellValue>], column: usize) -> char {
    let mut cells = rows
        .iter()
        .filter_map(|row| row.get(column))
        .filter(|cell| !cell.is_empty())
        .peekable();

    // An all-empty column stays left aligned, like a text column
    if cells.peek().is_none() {
        return 'l';
    }
    if cells.all(CellValue::is_numeric) { 'r' } else { 'l' }
}

fn padded(row: &[CellValue], width: usize) -> Vec<String> {
    (0..width)
        .map(|i| row.get(i).map(ToString::to_string).unwrap_or_default())
        .collect()
}

/// Split a sheet into header and data rows and pick column alignments.
pub fn sheet_to_table(sheet: &Sheet) -> SheetTable {
    let width = sheet.rows.iter().map(Vec::len).max().unwrap_or(0);
    let (header, data) = match sheet.rows.split_first() {
        Some((header, data)) => (padded(header, width), data),
        None => (Vec::new(), &[][..]),
    };

    SheetTable {
        name: sheet.name.clone(),
        header,
        rows: data.iter().map(|row| padded(row, width)).collect(),
        alignments: (0..width).map(|column| column_alignment(data, column)).collect(),
    }
}

/// Escape the characters LaTeX treats specially in text mode.
pub fn escape_latex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '~' => escaped.push_str("\\textasciitilde{}"),
            '^' => escaped.push_str("\\textasciicircum{}"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn render_row(cells: &[String], escape: bool) -> String {
    let cells: Vec<String> = if escape {
        cells.iter().map(|cell| escape_latex(cell)).collect()
    } else {
        cells.to_vec()
    };
    format!("{} \\\\\n", cells.join(" & "))
}

/// Render a table as a `table` float around a `booktabs` tabular.
///
/// ```rust
/// use folio::latex::{SheetTable, render_latex_table};
///
/// let table = SheetTable {
///     name: "Sheet1".to_string(),
///     header: vec!["h1".to_string(), "h2".to_string()],
///     rows: vec![vec!["a".to_string(), "1".to_string()]],
///     alignments: vec!['l', 'r'],
/// };
/// let latex = render_latex_table(&table, "ht", true);
/// assert!(latex.contains("\\begin{tabular}{lr}\n"));
/// assert!(latex.contains("a & 1 \\\\\n"));
/// ```
pub fn render_latex_table(table: &SheetTable, placement: &str, escape: bool) -> String {
    let columns: String = table.alignments.iter().collect();

    let mut out = String::new();
    out.push_str(&format!("\\begin{{table}}[{}] \n", placement));
    out.push_str("\\centering \n");
    out.push_str(&format!("\\begin{{tabular}}{{{}}}\n", columns));
    out.push_str("\\toprule\n");
    out.push_str(&render_row(&table.header, escape));
    out.push_str("\\midrule\n");
    for row in &table.rows {
        out.push_str(&render_row(row, escape));
    }
    out.push_str("\\bottomrule\n");
    out.push_str("\\end{tabular}\n");
    out.push_str("\\end{table} \n");
    out
}

/// Make a sheet name usable as part of a file name.
pub fn sanitize_file_component(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = sanitized.trim_matches('.');
    if sanitized.is_empty() {
        "sheet".to_string()
    } else {
        sanitized.to_string()
    }
}

/// Output path of one sheet's table.
pub fn table_output_path(output_dir: &Path, workbook: &Path, sheet: &str) -> PathBuf {
    output_dir.join(format!("{}_{}.txt", workbook_stem(workbook), sanitize_file_component(sheet)))
}

fn workbook_stem(workbook: &Path) -> String {
    workbook
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook".to_string())
}

/// Output path of one sheet's table, suffixed `_2`, `_3`, ... when an earlier
/// sheet of the same workbook already sanitized to the same file name.
///
/// `used` holds lowercased file names so names differing only in case do not
/// collide on case-insensitive filesystems.
fn unique_output_path(output_dir: &Path, workbook: &Path, sheet: &str, used: &mut HashSet<String>) -> PathBuf {
    let base = format!("{}_{}", workbook_stem(workbook), sanitize_file_component(sheet));
    let mut file_name = format!("{}.txt", base);
    let mut n = 2;
    while !used.insert(file_name.to_lowercase()) {
        file_name = format!("{}_{}.txt", base, n);
        n += 1;
    }
    output_dir.join(file_name)
}

/// Convert every non-empty sheet of `config.input` into a LaTeX table file.
///
/// Returns the written paths in workbook order. Empty sheets are skipped.
/// Sheets whose names sanitize to the same file name get numbered suffixes,
/// so every converted sheet has its own file.
///
/// # Errors
///
/// - `FolioError::Validation` for a bad configuration
/// - `FolioError::Io` if the workbook is missing or an output cannot be written
/// - `FolioError::Parsing` if the workbook cannot be read
pub fn convert_workbook(config: &LatexConfig) -> Result<Vec<PathBuf>> {
    config.validate()?;
    let sheets = read_workbook(&config.input)?;
    ensure_output_dir(&config.output_dir)?;

    let mut written = Vec::with_capacity(sheets.len());
    let mut used = HashSet::with_capacity(sheets.len());
    for sheet in &sheets {
        let table = sheet_to_table(sheet);
        if table.is_empty() {
            tracing::warn!("Sheet '{}' is empty, skipping", sheet.name);
            continue;
        }

        let path = unique_output_path(&config.output_dir, &config.input, &sheet.name, &mut used);
        if path != table_output_path(&config.output_dir, &config.input, &sheet.name) {
            tracing::warn!("Sheet '{}' clashes with an earlier sheet name, writing {}", sheet.name, path.display());
        }
        let latex = render_latex_table(&table, &config.placement, config.escape);
        write_atomic(&path, latex.as_bytes())?;
        tracing::debug!("Wrote {} ({} rows)", path.display(), table.rows.len());
        written.push(path);
    }

    tracing::info!(
        "Converted {} sheet(s) of {} into {}",
        written.len(),
        config.input.display(),
        config.output_dir.display()
    );
    Ok(written)
}
