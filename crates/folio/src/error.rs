//! Error types for Folio.
//!
//! Every fallible operation in the library returns [`FolioError`]. The rules
//! follow the way the procedures fail in practice:
//!
//! - `FolioError::Io` wraps `std::io::Error` unchanged. A missing input file,
//!   an unreadable search root or an unwritable output directory surface here
//!   and are always fatal.
//! - Document problems (corrupt PDF, unreadable workbook) are `Parsing`.
//! - Bad configuration or parameters are `Validation`.
//! - Failures of external tools are `Ocr` (tesseract) or `Processing`
//!   (ffmpeg); a tool or the pdfium library that cannot be found is
//!   `MissingDependency`.
//!
//! Keyword search and image extraction recover from per-item errors: a bad
//! document or image is recorded as skipped instead of being returned.
//!
//! # Example
//!
//! ```rust
//! use folio::{FolioError, Result};
//!
//! fn load_keywords(path: &str) -> Result<Vec<String>> {
//!     let content = std::fs::read_to_string(path)?;
//!     let keywords: Vec<String> = content.lines().map(str::to_owned).collect();
//!     if keywords.is_empty() {
//!         return Err(FolioError::validation(format!("No keywords in {}", path)));
//!     }
//!     Ok(keywords)
//! }
//! ```
use thiserror::Error;

/// Result type alias using `FolioError`.
pub type Result<T> = std::result::Result<T, FolioError>;

/// Main error type for all Folio operations.
#[derive(Debug, Error)]
pub enum FolioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parsing error: {message}")]
    Parsing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("OCR error: {message}")]
    Ocr {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Image processing error: {message}")]
    ImageProcessing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Processing error: {message}")]
    Processing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    Other(String),
}

impl From<calamine::Error> for FolioError {
    fn from(err: calamine::Error) -> Self {
        FolioError::Parsing {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for FolioError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        FolioError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(err: serde_json::Error) -> Self {
        FolioError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<crate::pdf::error::PdfError> for FolioError {
    fn from(err: crate::pdf::error::PdfError) -> Self {
        match err {
            crate::pdf::error::PdfError::LibraryUnavailable(message) => FolioError::MissingDependency(message),
            other => FolioError::Parsing {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl FolioError {
    error_constructor!(parsing, Parsing);
    error_constructor!(ocr, Ocr);
    error_constructor!(validation, Validation);
    error_constructor!(image_processing, ImageProcessing);
    error_constructor!(serialization, Serialization);
    error_constructor!(processing, Processing);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FolioError = io_err.into();
        assert!(matches!(err, FolioError::Io(_)));
        assert!(err.to_string().contains("IO error"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_parsing_error() {
        let err = FolioError::parsing("invalid format");
        assert_eq!(err.to_string(), "Parsing error: invalid format");
    }

    #[test]
    fn test_parsing_error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad data");
        let err = FolioError::parsing_with_source("invalid format", source);
        assert_eq!(err.to_string(), "Parsing error: invalid format");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_ocr_error() {
        let err = FolioError::ocr("tesseract exited with status 1");
        assert_eq!(err.to_string(), "OCR error: tesseract exited with status 1");
    }

    #[test]
    fn test_validation_error() {
        let err = FolioError::validation("keyword set is empty");
        assert_eq!(err.to_string(), "Validation error: keyword set is empty");
    }

    #[test]
    fn test_processing_error_with_source() {
        let source = std::io::Error::other("ffmpeg crashed");
        let err = FolioError::processing_with_source("GIF conversion failed", source);
        assert_eq!(err.to_string(), "Processing error: GIF conversion failed");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_missing_dependency_error() {
        let err = FolioError::MissingDependency("tesseract not found".to_string());
        assert_eq!(err.to_string(), "Missing dependency: tesseract not found");
    }

    #[test]
    fn test_calamine_error_conversion() {
        let cal_err = calamine::Error::Msg("invalid Excel file");
        let err: FolioError = cal_err.into();
        assert!(matches!(err, FolioError::Parsing { .. }));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: FolioError = json_err.into();
        assert!(matches!(err, FolioError::Serialization { .. }));
    }

    #[test]
    fn test_pdf_error_conversion() {
        let pdf_err = crate::pdf::error::PdfError::InvalidPdf("corrupt PDF".to_string());
        let err: FolioError = pdf_err.into();
        assert!(matches!(err, FolioError::Parsing { .. }));
        assert!(err.to_string().contains("corrupt PDF"));
    }

    #[test]
    fn test_io_error_bubbles_unchanged() {
        fn read_file() -> Result<String> {
            let content = std::fs::read_to_string("/nonexistent/file.txt")?;
            Ok(content)
        }

        assert!(matches!(read_file().unwrap_err(), FolioError::Io(_)));
    }
}
