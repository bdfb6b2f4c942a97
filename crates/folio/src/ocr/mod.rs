//! OCR of image-only PDFs into searchable PDFs.
//!
//! Requires the `tesseract` executable (version 4 or newer) on `PATH`, in
//! `FOLIO_TESSERACT_PATH`, or given explicitly in [`OcrConfig`].
//!
//! [`OcrConfig`]: crate::core::config::OcrConfig
//!
//! # Example
//!
//! ```rust,no_run
//! use folio::core::config::OcrConfig;
//! use folio::ocr::make_searchable_pdf;
//!
//! # async fn example() -> folio::Result<()> {
//! let config = OcrConfig {
//!     input: "scan.pdf".into(),
//!     output: "searchable.pdf".into(),
//!     ..Default::default()
//! };
//! let report = make_searchable_pdf(&config).await?;
//! println!("OCR'd {} pages", report.page_count);
//! # Ok(())
//! # }
//! ```
pub mod searchable;
pub mod tesseract;

pub use searchable::{OcrReport, make_searchable_pdf};
pub use tesseract::{
    check_tesseract_available, locate_tesseract, ocr_image_to_pdf, parse_tesseract_version, validate_language,
};
