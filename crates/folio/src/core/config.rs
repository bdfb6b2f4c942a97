//! Configuration loading and management.
//!
//! Every procedure takes an explicit configuration struct instead of
//! hard-coded paths. The structs can be built in code, or loaded as sections
//! of a [`FolioConfig`] file (TOML, YAML or JSON) and then overridden by CLI
//! flags.

use crate::{FolioError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file searched for by [`FolioConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "folio.toml";

/// Top-level configuration file.
///
/// Each section holds the defaults for one procedure. Missing sections fall
/// back to that procedure's `Default`.
///
/// ```toml
/// [search]
/// root = "/papers/auv"
/// output = "/lists/hotel_power.xlsx"
/// keywords = ["hotel load", "base load"]
///
/// [ocr]
/// dpi = 200
/// language = "eng"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolioConfig {
    #[serde(default)]
    pub search: Option<KeywordSearchConfig>,

    #[serde(default)]
    pub ocr: Option<OcrConfig>,

    #[serde(default)]
    pub tables: Option<TableScrapeConfig>,

    #[serde(default)]
    pub images: Option<ImageExtractionConfig>,

    #[serde(default)]
    pub gif: Option<GifConfig>,

    #[serde(default)]
    pub latex: Option<LatexConfig>,
}

/// Keyword search over a directory of documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordSearchConfig {
    /// Directory walked recursively
    #[serde(default)]
    pub root: PathBuf,

    /// Spreadsheet receiving the matching paths
    #[serde(default)]
    pub output: PathBuf,

    /// Keyword patterns; a document matches if any of them occurs in its text
    #[serde(default)]
    pub keywords: Vec<String>,

    /// File-name suffix selecting candidate documents (case-sensitive)
    #[serde(default = "default_pdf_suffix")]
    pub suffix: String,

    /// Treat keywords as literal text instead of regex fragments
    #[serde(default)]
    pub literal: bool,

    /// Sort candidate paths before processing for reproducible output
    #[serde(default)]
    pub sort: bool,

    /// Only read the first N pages of each document (None = all pages)
    #[serde(default)]
    pub max_pages: Option<u32>,
}

/// Fixed raster size used for every page, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
}

/// OCR of an image-only PDF into a searchable PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default)]
    pub input: PathBuf,

    #[serde(default)]
    pub output: PathBuf,

    /// Rasterization resolution, also passed to tesseract
    #[serde(default = "default_ocr_dpi")]
    pub dpi: u32,

    /// Fixed page size; when None the size follows from `dpi`
    #[serde(default = "default_page_size")]
    pub page_size: Option<PageSize>,

    /// Tesseract language code(s), e.g. "eng" or "eng+deu"
    #[serde(default = "default_eng")]
    pub language: String,

    /// Explicit tesseract executable
    #[serde(default)]
    pub tesseract_path: Option<PathBuf>,

    /// Per-page OCR timeout
    #[serde(default = "default_ocr_timeout")]
    pub timeout_secs: u64,
}

/// Table scraping from a page range into a spreadsheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableScrapeConfig {
    #[serde(default)]
    pub input: PathBuf,

    #[serde(default)]
    pub output: PathBuf,

    /// Page selection: "all", or 1-based pages and ranges such as "1,3-5" or "2-end"
    #[serde(default = "default_pages")]
    pub pages: String,

    /// Horizontal gap (PDF units) separating table columns
    #[serde(default = "default_column_threshold")]
    pub column_threshold: u32,

    /// Vertical overlap ratio for words to share a row
    #[serde(default = "default_row_threshold_ratio")]
    pub row_threshold_ratio: f64,

    /// Minimum word confidence kept for reconstruction
    #[serde(default)]
    pub min_confidence: f64,
}

/// Embedded image extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageExtractionConfig {
    #[serde(default)]
    pub input: PathBuf,

    /// Directory receiving `p{page}-{xref}.png` files (created if missing)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

/// Video to animated GIF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GifConfig {
    #[serde(default)]
    pub input: PathBuf,

    #[serde(default)]
    pub output: PathBuf,

    /// Playback speed multiplier
    #[serde(default = "default_speed")]
    pub speed: f64,

    /// Output frame rate (None = keep the source rate)
    #[serde(default)]
    pub fps: Option<u32>,

    /// Output width in pixels, height keeps the aspect ratio
    #[serde(default)]
    pub width: Option<u32>,

    /// Explicit ffmpeg executable
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default = "default_gif_timeout")]
    pub timeout_secs: u64,
}

/// Spreadsheet sheets to LaTeX table files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatexConfig {
    #[serde(default)]
    pub input: PathBuf,

    /// Directory receiving one `.txt` file per sheet (created if missing)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Float placement specifier of the table environment
    #[serde(default = "default_placement")]
    pub placement: String,

    /// Escape LaTeX special characters in cell text
    #[serde(default = "default_true")]
    pub escape: bool,
}

fn default_true() -> bool {
    true
}
fn default_pdf_suffix() -> String {
    ".pdf".to_string()
}
fn default_eng() -> String {
    "eng".to_string()
}
fn default_ocr_dpi() -> u32 {
    200
}
fn default_page_size() -> Option<PageSize> {
    Some(PageSize {
        width: 1654,
        height: 2340,
    })
}
fn default_ocr_timeout() -> u64 {
    300
}
fn default_pages() -> String {
    "1".to_string()
}
fn default_column_threshold() -> u32 {
    50
}
fn default_row_threshold_ratio() -> f64 {
    0.5
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_speed() -> f64 {
    10.0
}
fn default_gif_timeout() -> u64 {
    600
}
fn default_placement() -> String {
    "ht".to_string()
}

impl Default for KeywordSearchConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            output: PathBuf::new(),
            keywords: Vec::new(),
            suffix: default_pdf_suffix(),
            literal: false,
            sort: false,
            max_pages: None,
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::new(),
            dpi: default_ocr_dpi(),
            page_size: default_page_size(),
            language: default_eng(),
            tesseract_path: None,
            timeout_secs: default_ocr_timeout(),
        }
    }
}

impl Default for TableScrapeConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::new(),
            pages: default_pages(),
            column_threshold: default_column_threshold(),
            row_threshold_ratio: default_row_threshold_ratio(),
            min_confidence: 0.0,
        }
    }
}

impl Default for ImageExtractionConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for GifConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::new(),
            speed: default_speed(),
            fps: None,
            width: None,
            ffmpeg_path: None,
            timeout_secs: default_gif_timeout(),
        }
    }
}

impl Default for LatexConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output_dir: default_output_dir(),
            placement: default_placement(),
            escape: true,
        }
    }
}

fn require_path(path: &Path, field: &str) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(FolioError::validation(format!("'{}' must be set", field)));
    }
    Ok(())
}

impl KeywordSearchConfig {
    pub fn validate(&self) -> Result<()> {
        require_path(&self.root, "root")?;
        require_path(&self.output, "output")?;

        if self.keywords.is_empty() {
            return Err(FolioError::validation("At least one keyword is required"));
        }
        if let Some(position) = self.keywords.iter().position(|k| k.is_empty()) {
            return Err(FolioError::validation(format!(
                "Keyword #{} is empty; an empty pattern would match every document",
                position + 1
            )));
        }
        if self.suffix.is_empty() {
            return Err(FolioError::validation("Document suffix must not be empty"));
        }
        if self.max_pages == Some(0) {
            return Err(FolioError::validation("max_pages must be at least 1"));
        }
        Ok(())
    }
}

impl OcrConfig {
    pub fn validate(&self) -> Result<()> {
        require_path(&self.input, "input")?;
        require_path(&self.output, "output")?;

        if !(36..=1200).contains(&self.dpi) {
            return Err(FolioError::validation(format!(
                "DPI must be between 36 and 1200, got {}",
                self.dpi
            )));
        }
        if let Some(size) = self.page_size
            && (size.width == 0 || size.height == 0)
        {
            return Err(FolioError::validation(format!(
                "Page size must be positive, got {}x{}",
                size.width, size.height
            )));
        }
        crate::ocr::tesseract::validate_language(&self.language)?;
        if self.timeout_secs == 0 {
            return Err(FolioError::validation("timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

impl TableScrapeConfig {
    pub fn validate(&self) -> Result<()> {
        require_path(&self.input, "input")?;
        require_path(&self.output, "output")?;
        crate::pdf::pages::PageSelection::parse(&self.pages)?;

        if !(0.0..=1.0).contains(&self.row_threshold_ratio) {
            return Err(FolioError::validation(format!(
                "row_threshold_ratio must be within 0.0..=1.0, got {}",
                self.row_threshold_ratio
            )));
        }
        if !(0.0..=100.0).contains(&self.min_confidence) {
            return Err(FolioError::validation(format!(
                "min_confidence must be within 0.0..=100.0, got {}",
                self.min_confidence
            )));
        }
        Ok(())
    }
}

impl ImageExtractionConfig {
    pub fn validate(&self) -> Result<()> {
        require_path(&self.input, "input")?;
        require_path(&self.output_dir, "output_dir")
    }
}

impl GifConfig {
    pub fn validate(&self) -> Result<()> {
        require_path(&self.input, "input")?;
        require_path(&self.output, "output")?;

        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(FolioError::validation(format!(
                "Speed must be a positive number, got {}",
                self.speed
            )));
        }
        if self.fps == Some(0) {
            return Err(FolioError::validation("fps must be at least 1"));
        }
        if self.width == Some(0) {
            return Err(FolioError::validation("width must be at least 1"));
        }
        if self.timeout_secs == 0 {
            return Err(FolioError::validation("timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

impl LatexConfig {
    pub fn validate(&self) -> Result<()> {
        require_path(&self.input, "input")?;
        require_path(&self.output_dir, "output_dir")?;

        if !self.placement.chars().all(|c| matches!(c, 'h' | 't' | 'b' | 'p' | 'H' | '!')) {
            return Err(FolioError::validation(format!(
                "Invalid table placement '{}', expected letters from 'htbpH!'",
                self.placement
            )));
        }
        Ok(())
    }
}

impl FolioConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `FolioError::Validation` if the file cannot be read or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        toml::from_str(&content)
            .map_err(|e| FolioError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| FolioError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        serde_json::from_str(&content)
            .map_err(|e| FolioError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration, choosing the format from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("toml") => Self::from_toml_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(FolioError::validation(format!(
                "Unsupported config file format: {} (expected .toml, .yaml, .yml or .json)",
                path.display()
            ))),
        }
    }

    /// Discover `folio.toml` in the current directory or any parent.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let current = std::env::current_dir().map_err(FolioError::Io)?;
        Self::discover_from(&current)
    }

    /// Same as [`FolioConfig::discover`], starting at `start`.
    pub fn discover_from(start: &Path) -> Result<Option<Self>> {
        for dir in start.ancestors() {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                tracing::debug!("Using configuration file {}", candidate.display());
                return Ok(Some(Self::from_toml_file(candidate)?));
            }
        }
        Ok(None)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| FolioError::validation(format!("Failed to read config file {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn search_config() -> KeywordSearchConfig {
        KeywordSearchConfig {
            root: PathBuf::from("/papers"),
            output: PathBuf::from("/lists/out.xlsx"),
            keywords: vec!["hotel load".to_string(), "base load".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let search = KeywordSearchConfig::default();
        assert_eq!(search.suffix, ".pdf");
        assert!(!search.literal);
        assert_eq!(search.max_pages, None);

        let ocr = OcrConfig::default();
        assert_eq!(ocr.dpi, 200);
        assert_eq!(
            ocr.page_size,
            Some(PageSize {
                width: 1654,
                height: 2340
            })
        );

        assert_eq!(GifConfig::default().speed, 10.0);
        assert_eq!(LatexConfig::default().placement, "ht");
    }

    #[test]
    fn test_search_config_validation() {
        assert!(search_config().validate().is_ok());

        let mut config = search_config();
        config.keywords.clear();
        assert!(matches!(config.validate().unwrap_err(), FolioError::Validation { .. }));

        let mut config = search_config();
        config.keywords.push(String::new());
        assert!(config.validate().unwrap_err().to_string().contains("#3"));

        let mut config = search_config();
        config.root = PathBuf::new();
        assert!(config.validate().unwrap_err().to_string().contains("'root'"));

        let mut config = search_config();
        config.max_pages = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_gif_config_rejects_bad_speed() {
        let mut config = GifConfig {
            input: PathBuf::from("in.mpeg"),
            output: PathBuf::from("out.gif"),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        for speed in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            config.speed = speed;
            assert!(config.validate().is_err(), "speed {} should be rejected", speed);
        }
    }

    #[test]
    fn test_latex_config_rejects_bad_placement() {
        let mut config = LatexConfig {
            input: PathBuf::from("book.xlsx"),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        config.placement = "h}\\evil{".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_table_config_validates_pages() {
        let mut config = TableScrapeConfig {
            input: PathBuf::from("report.pdf"),
            output: PathBuf::from("tables.xlsx"),
            pages: "2-4,7".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        config.pages = "4-2".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("folio.toml");
        std::fs::write(
            &path,
            r#"
[search]
root = "/papers"
output = "/lists/out.xlsx"
keywords = ["hotel load", "base load"]
literal = true

[ocr]
dpi = 300
page_size = { width = 2480, height = 3508 }
"#,
        )
        .unwrap();

        let config = FolioConfig::from_toml_file(&path).unwrap();
        let search = config.search.unwrap();
        assert_eq!(search.keywords.len(), 2);
        assert!(search.literal);
        assert_eq!(search.suffix, ".pdf");

        let ocr = config.ocr.unwrap();
        assert_eq!(ocr.dpi, 300);
        assert_eq!(ocr.page_size.unwrap().width, 2480);
        assert_eq!(ocr.language, "eng");

        assert!(config.tables.is_none());
    }

    #[test]
    fn test_from_file_dispatches_on_extension() {
        let dir = tempdir().unwrap();

        let json = dir.path().join("config.json");
        std::fs::write(&json, r#"{"gif": {"speed": 2.5}}"#).unwrap();
        assert_eq!(FolioConfig::from_file(&json).unwrap().gif.unwrap().speed, 2.5);

        let yaml = dir.path().join("config.yaml");
        std::fs::write(&yaml, "latex:\n  placement: \"h!\"\n").unwrap();
        assert_eq!(FolioConfig::from_file(&yaml).unwrap().latex.unwrap().placement, "h!");

        let ini = dir.path().join("config.ini");
        std::fs::write(&ini, "").unwrap();
        assert!(FolioConfig::from_file(&ini).is_err());
    }

    #[test]
    fn test_invalid_toml_is_validation_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("folio.toml");
        std::fs::write(&path, "[search\nroot = ").unwrap();

        let err = FolioConfig::from_toml_file(&path).unwrap_err();
        assert!(matches!(err, FolioError::Validation { .. }));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_discover_from_parent_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[images]\noutput_dir = \"imgs\"\n").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = FolioConfig::discover_from(&nested).unwrap().unwrap();
        assert_eq!(config.images.unwrap().output_dir, PathBuf::from("imgs"));
    }

    #[test]
    fn test_discover_from_without_config() {
        let dir = tempdir().unwrap();
        // Ancestors of a temp dir normally carry no folio.toml
        if dir.path().ancestors().skip(1).any(|d| d.join(CONFIG_FILE_NAME).exists()) {
            return;
        }
        assert!(FolioConfig::discover_from(dir.path()).unwrap().is_none());
    }
}
