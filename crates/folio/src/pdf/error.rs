use std::fmt;

#[derive(Debug, Clone)]
pub enum PdfError {
    InvalidPdf(String),
    PasswordRequired,
    PageNotFound(usize),
    TextExtractionFailed(String),
    RenderingFailed(String),
    ImageDecodingFailed(String),
    MergeFailed(String),
    LibraryUnavailable(String),
}

impl fmt::Display for PdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfError::InvalidPdf(msg) => write!(f, "Invalid PDF: {}", msg),
            PdfError::PasswordRequired => write!(f, "PDF is password-protected"),
            PdfError::PageNotFound(page) => write!(f, "Page {} not found", page),
            PdfError::TextExtractionFailed(msg) => write!(f, "Text extraction failed: {}", msg),
            PdfError::RenderingFailed(msg) => write!(f, "Page rendering failed: {}", msg),
            PdfError::ImageDecodingFailed(msg) => write!(f, "Image decoding failed: {}", msg),
            PdfError::MergeFailed(msg) => write!(f, "PDF merge failed: {}", msg),
            PdfError::LibraryUnavailable(msg) => write!(f, "Pdfium unavailable: {}", msg),
        }
    }
}

impl std::error::Error for PdfError {}

// No From<std::io::Error>: I/O errors are returned as FolioError::Io by callers.

impl From<lopdf::Error> for PdfError {
    fn from(err: lopdf::Error) -> Self {
        PdfError::InvalidPdf(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PdfError>;

/// Map a pdfium load error, telling encrypted documents apart from corrupt ones.
pub(crate) fn classify_load_error(message: String) -> PdfError {
    if message.contains("password") || message.contains("Password") {
        PdfError::PasswordRequired
    } else {
        PdfError::InvalidPdf(message)
    }
}
