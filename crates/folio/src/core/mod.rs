//! Shared configuration and file-system plumbing.
//!
//! - **Configuration**: one config struct per procedure, plus [`FolioConfig`]
//!   for loading them from `folio.toml` (or YAML/JSON)
//! - **I/O**: directory traversal, input validation and atomic output writes
pub mod config;
pub mod io;

pub use config::{
    FolioConfig, GifConfig, ImageExtractionConfig, KeywordSearchConfig, LatexConfig, OcrConfig, PageSize,
    TableScrapeConfig,
};
