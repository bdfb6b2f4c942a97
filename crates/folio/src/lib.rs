//! Folio - research document toolkit
//!
//! Small, independent procedures for working with a folder of papers:
//!
//! - **Keyword search** (`search`): find the PDFs whose text mentions any of
//!   a set of keywords and list them in a spreadsheet
//! - **OCR** (`ocr`): turn an image-only PDF into a searchable one with tesseract
//! - **Table scraping** (`tables`): copy tables from PDF pages into a spreadsheet
//! - **Image extraction** (`pdf::images`): dump embedded images as PNG files
//! - **Video to GIF** (`video`): speed up a clip and save it as an animated GIF
//! - **LaTeX tables** (`latex`): render each workbook sheet as a booktabs table
//!
//! Every procedure takes an explicit configuration struct (see
//! [`core::config`]) and returns a report or [`FolioError`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use folio::core::config::KeywordSearchConfig;
//! use folio::search::run_keyword_search;
//!
//! # fn main() -> folio::Result<()> {
//! let config = KeywordSearchConfig {
//!     root: "papers/auv".into(),
//!     output: "hotel_power.xlsx".into(),
//!     keywords: vec!["hotel load".to_string(), "base load".to_string()],
//!     ..Default::default()
//! };
//! let report = run_keyword_search(&config)?;
//! println!("{} of {} documents matched", report.matched_count(), report.len());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod latex;
pub mod ocr;
pub mod pdf;
pub mod search;
pub mod spreadsheet;
pub mod tables;
pub mod video;

pub(crate) mod subprocess;

pub use error::{FolioError, Result};
