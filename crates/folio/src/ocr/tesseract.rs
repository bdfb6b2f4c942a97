//! The tesseract executable.
//!
//! Each page image is piped to `tesseract stdin stdout -l <lang> --dpi <dpi>
//! pdf`, which answers with a one-page PDF holding the image and an invisible
//! text layer.

use crate::subprocess::{RunError, Tool, run_with_timeout, stderr_tail};
use crate::{FolioError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Oldest tesseract release with the `pdf` renderer reading from stdin.
pub const MINIMAL_SUPPORTED_TESSERACT_VERSION: u32 = 4;

pub const TESSERACT_PATH_ENV: &str = "FOLIO_TESSERACT_PATH";

const VERSION_CHECK_TIMEOUT_SECS: u64 = 30;

pub(crate) const TESSERACT: Tool = Tool {
    name: "Tesseract OCR",
    env_var: TESSERACT_PATH_ENV,
    binaries: &["tesseract", "tesseract.exe"],
    install_hint: "Install: macOS: 'brew install tesseract', Linux: 'apt install tesseract-ocr', \
Windows: https://github.com/UB-Mannheim/tesseract/wiki.",
};

/// Find the tesseract executable.
pub fn locate_tesseract(explicit: Option<&Path>) -> Result<PathBuf> {
    TESSERACT.locate(explicit)
}

/// Major version from `tesseract --version` output.
///
/// The first line reads `tesseract 5.3.0` (or `tesseract v5.0.0-alpha` on
/// some builds).
pub fn parse_tesseract_version(output: &str) -> Option<u32> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix("tesseract "))
        .map(|version| version.trim().trim_start_matches('v'))
        .and_then(|version| {
            let major: String = version.chars().take_while(char::is_ascii_digit).collect();
            major.parse().ok()
        })
}

/// Locate tesseract and check that it runs and is recent enough.
///
/// Returns the executable path.
pub async fn check_tesseract_available(explicit: Option<&Path>) -> Result<PathBuf> {
    let tesseract = locate_tesseract(explicit)?;

    let output = run_with_timeout(&tesseract, &["--version".into()], None, VERSION_CHECK_TIMEOUT_SECS)
        .await
        .map_err(|e| {
            FolioError::MissingDependency(format!(
                "Tesseract executable '{}' could not be executed: {}",
                tesseract.display(),
                e
            ))
        })?;

    // Older releases print the version banner on stderr.
    let banner = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    let version = parse_tesseract_version(&banner).ok_or_else(|| {
        FolioError::MissingDependency(format!(
            "Could not determine the version of '{}'",
            tesseract.display()
        ))
    })?;

    if version < MINIMAL_SUPPORTED_TESSERACT_VERSION {
        return Err(FolioError::MissingDependency(format!(
            "Tesseract version {} is not supported. Minimum required version is {}",
            version, MINIMAL_SUPPORTED_TESSERACT_VERSION
        )));
    }

    tracing::debug!("Using tesseract {} at {}", version, tesseract.display());
    Ok(tesseract)
}

/// Check a tesseract language argument such as `eng` or `eng+deu`.
///
/// Codes are traineddata names: lowercase letters, digits and underscores.
/// Whether the data is installed is only known once tesseract runs.
pub fn validate_language(language: &str) -> Result<()> {
    if language.is_empty() {
        return Err(FolioError::validation("OCR language must not be empty"));
    }
    for code in language.split('+') {
        let valid = !code.is_empty()
            && code
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            return Err(FolioError::validation(format!(
                "Invalid tesseract language code '{}' in '{}'",
                code, language
            )));
        }
    }
    Ok(())
}

/// Command-line arguments for one page.
pub fn tesseract_args(language: &str, dpi: u32) -> Vec<OsString> {
    ["stdin", "stdout", "-l", language, "--dpi", &dpi.to_string(), "pdf"]
        .into_iter()
        .map(OsString::from)
        .collect()
}

/// OCR one image into a single-page searchable PDF.
///
/// # Errors
///
/// `FolioError::Ocr` if tesseract fails, times out, or returns something
/// that is not a PDF.
pub async fn ocr_image_to_pdf(
    tesseract: &Path,
    image: Vec<u8>,
    language: &str,
    dpi: u32,
    timeout_secs: u64,
) -> Result<Vec<u8>> {
    let output = run_with_timeout(tesseract, &tesseract_args(language, dpi), Some(image), timeout_secs)
        .await
        .map_err(|e| match e {
            RunError::TimedOut(secs) => FolioError::ocr(format!("Tesseract timed out after {} seconds", secs)),
            other => FolioError::ocr(format!("Failed to run tesseract: {}", other)),
        })?;

    if !output.status.success() {
        return Err(FolioError::ocr(format!(
            "Tesseract exited with status {}: {}",
            output.status.code().unwrap_or(-1),
            stderr_tail(&output)
        )));
    }
    if !output.stdout.starts_with(b"%PDF") {
        return Err(FolioError::ocr(format!(
            "Tesseract did not produce a PDF: {}",
            stderr_tail(&output)
        )));
    }

    Ok(output.stdout)
}
