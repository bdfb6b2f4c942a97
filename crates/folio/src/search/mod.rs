//! Keyword search over a directory of PDFs.
//!
//! Walks a root directory, extracts the text of every PDF, and records the
//! documents that mention any keyword. The result can be written as a
//! one-column spreadsheet headed `Files`.
//!
//! A document that cannot be read (corrupt, encrypted, unreadable) is
//! recorded as [`FileOutcome::Skipped`] and the walk continues. Only a
//! failure to walk the tree or to write the output is returned as an error.
//!
//! # Example
//!
//! ```rust,no_run
//! use folio::core::config::KeywordSearchConfig;
//! use folio::pdf::LopdfTextExtractor;
//! use folio::search::search_directory;
//!
//! # fn main() -> folio::Result<()> {
//! let config = KeywordSearchConfig {
//!     root: "papers".into(),
//!     output: "matches.xlsx".into(),
//!     keywords: vec!["hotel load".to_string()],
//!     ..Default::default()
//! };
//! let report = search_directory(&config, &LopdfTextExtractor::default())?;
//! for path in report.matched_paths() {
//!     println!("{}", path.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod matcher;

pub use matcher::KeywordMatcher;

use crate::core::config::KeywordSearchConfig;
use crate::core::io::find_files_by_suffix;
use crate::pdf::text::{LopdfTextExtractor, TextExtractor};
use crate::spreadsheet::write_rows;
use crate::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Header of the single output column.
pub const OUTPUT_HEADER: &str = "Files";

const NON_UTF8_PATH: &str = "non-UTF-8 path";

/// What happened to one candidate document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum FileOutcome {
    Matched,
    NotMatched,
    Skipped(String),
}

/// Per-document outcomes in processing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchReport {
    pub entries: Vec<(PathBuf, FileOutcome)>,
}

impl SearchReport {
    /// Matching documents, in processing order.
    pub fn matched_paths(&self) -> impl Iterator<Item = &Path> {
        self.entries
            .iter()
            .filter(|(_, outcome)| *outcome == FileOutcome::Matched)
            .map(|(path, _)| path.as_path())
    }

    /// Documents that could not be read, with the reason.
    pub fn skipped(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.entries.iter().filter_map(|(path, outcome)| match outcome {
            FileOutcome::Skipped(reason) => Some((path.as_path(), reason.as_str())),
            _ => None,
        })
    }

    pub fn matched_count(&self) -> usize {
        self.matched_paths().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped().count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Candidate documents under `root`, optionally sorted.
///
/// Without `sort` the order is whatever the filesystem yields.
pub fn find_candidates(root: impl AsRef<Path>, suffix: &str, sort: bool) -> Result<Vec<PathBuf>> {
    let mut candidates = find_files_by_suffix(root, suffix)?;
    if sort {
        candidates.sort();
    }
    Ok(candidates)
}

/// Classify every candidate document under `config.root`.
///
/// Writes nothing. Extraction errors become [`FileOutcome::Skipped`], as do
/// paths that are not valid UTF-8, since the workbook could not hold them
/// unchanged.
///
/// # Errors
///
/// - `FolioError::Validation` for an invalid configuration or keyword set
/// - `FolioError::Io` if the root is missing or a directory cannot be read
pub fn search_directory(config: &KeywordSearchConfig, extractor: &dyn TextExtractor) -> Result<SearchReport> {
    config.validate()?;
    let matcher = KeywordMatcher::new(&config.keywords, config.literal)?;
    let candidates = find_candidates(&config.root, &config.suffix, config.sort)?;

    tracing::debug!(
        "Searching {} document(s) under {} for /{}/",
        candidates.len(),
        config.root.display(),
        matcher.pattern()
    );

    let mut report = SearchReport {
        entries: Vec::with_capacity(candidates.len()),
    };
    for path in candidates {
        if path.to_str().is_none() {
            tracing::warn!("Skipping {}: path is not valid UTF-8", path.display());
            report.entries.push((path, FileOutcome::Skipped(NON_UTF8_PATH.to_string())));
            continue;
        }

        let outcome = match extractor.extract_text(&path) {
            Ok(text) if matcher.is_match(&text) => FileOutcome::Matched,
            Ok(_) => FileOutcome::NotMatched,
            Err(err) => {
                tracing::debug!("Skipping {}: {}", path.display(), err);
                FileOutcome::Skipped(err.to_string())
            }
        };
        report.entries.push((path, outcome));
    }

    Ok(report)
}

/// Write matching paths as a one-column workbook headed `Files`.
///
/// Cells hold the path text; a path that is not valid UTF-8 is written with
/// replacement characters. [`search_directory`] never reports such a path as
/// matched.
pub fn write_match_table<P: AsRef<Path>>(paths: &[P], output: impl AsRef<Path>) -> Result<()> {
    let rows: Vec<Vec<String>> = paths
        .iter()
        .map(|path| vec![path.as_ref().to_string_lossy().into_owned()])
        .collect();
    write_rows(output, Some(&[OUTPUT_HEADER]), &rows)
}

/// Search `config.root` and write the matches to `config.output`.
///
/// Uses [`LopdfTextExtractor`] honouring `config.max_pages`.
pub fn run_keyword_search(config: &KeywordSearchConfig) -> Result<SearchReport> {
    run_keyword_search_with(config, &LopdfTextExtractor::new(config.max_pages))
}

/// [`run_keyword_search`] with a caller-supplied extractor.
pub fn run_keyword_search_with(config: &KeywordSearchConfig, extractor: &dyn TextExtractor) -> Result<SearchReport> {
    let report = search_directory(config, extractor)?;
    let matched: Vec<&Path> = report.matched_paths().collect();
    write_match_table(&matched, &config.output)?;

    tracing::info!(
        "{} of {} document(s) matched, {} skipped; wrote {}",
        matched.len(),
        report.len(),
        report.skipped_count(),
        config.output.display()
    );
    Ok(report)
}
