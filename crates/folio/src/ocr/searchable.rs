use super::tesseract::{check_tesseract_available, ocr_image_to_pdf};
use crate::core::config::OcrConfig;
use crate::core::io::{read_file_sync, validate_input_file, write_atomic};
use crate::pdf::merge::merge_pdf_pages;
use crate::pdf::rendering::{RenderSize, render_pages_to_png};
use crate::{FolioError, Result};
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of a successful OCR run.
#[derive(Debug, Clone, Serialize)]
pub struct OcrReport {
    pub output: PathBuf,
    pub page_count: usize,
}

fn render_size(config: &OcrConfig) -> RenderSize {
    match config.page_size {
        Some(size) => RenderSize::Fixed {
            width: size.width,
            height: size.height,
        },
        None => RenderSize::Dpi(config.dpi),
    }
}

/// Convert an image-only PDF into a searchable PDF.
///
/// Pages are rasterized, OCR'd one at a time and merged in order. The output
/// is written only after every page succeeded.
///
/// # Errors
///
/// - `FolioError::Io` if the input is missing or the output cannot be written
/// - `FolioError::Parsing` if the input cannot be rendered
/// - `FolioError::MissingDependency` if tesseract is unavailable
/// - `FolioError::Ocr` if tesseract fails on a page
/// - `FolioError::Validation` for a bad configuration or a document without pages
pub async fn make_searchable_pdf(config: &OcrConfig) -> Result<OcrReport> {
    config.validate()?;
    validate_input_file(&config.input)?;
    let tesseract = check_tesseract_available(config.tesseract_path.as_deref()).await?;

    let pdf_bytes = read_file_sync(&config.input)?;
    let size = render_size(config);
    let pages = tokio::task::spawn_blocking(move || render_pages_to_png(&pdf_bytes, size))
        .await
        .map_err(|e| FolioError::Other(format!("Rendering task failed: {}", e)))??;

    if pages.is_empty() {
        return Err(FolioError::validation(format!(
            "{} has no pages",
            config.input.display()
        )));
    }

    let page_count = pages.len();
    let mut page_pdfs = Vec::with_capacity(page_count);
    for (index, png) in pages.into_iter().enumerate() {
        tracing::debug!("OCR page {}/{}", index + 1, page_count);
        let pdf = ocr_image_to_pdf(&tesseract, png, &config.language, config.dpi, config.timeout_secs)
            .await
            .map_err(|e| match e {
                FolioError::Ocr { message, source } => FolioError::Ocr {
                    message: format!("page {}: {}", index + 1, message),
                    source,
                },
                other => other,
            })?;
        page_pdfs.push(pdf);
    }

    let merged = merge_pdf_pages(&page_pdfs)?;
    write_atomic(&config.output, &merged)?;

    tracing::info!(
        "Wrote searchable PDF {} ({} page(s))",
        config.output.display(),
        page_count
    );
    Ok(OcrReport {
        output: config.output.clone(),
        page_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PageSize;
    use tempfile::tempdir;

    #[test]
    fn test_render_size_prefers_fixed_page_size() {
        let config = OcrConfig::default();
        assert_eq!(
            render_size(&config),
            RenderSize::Fixed {
                width: 1654,
                height: 2340
            }
        );

        let config = OcrConfig {
            page_size: None,
            dpi: 300,
            ..Default::default()
        };
        assert_eq!(render_size(&config), RenderSize::Dpi(300));

        let config = OcrConfig {
            page_size: Some(PageSize { width: 10, height: 20 }),
            ..Default::default()
        };
        assert_eq!(render_size(&config), RenderSize::Fixed { width: 10, height: 20 });
    }

    #[tokio::test]
    async fn test_missing_input_is_io_error() {
        let dir = tempdir().unwrap();
        let config = OcrConfig {
            input: dir.path().join("scan.pdf"),
            output: dir.path().join("searchable.pdf"),
            ..Default::default()
        };

        let err = make_searchable_pdf(&config).await.unwrap_err();
        assert!(matches!(err, FolioError::Io(_)));
        assert!(!config.output.exists());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_first() {
        let config = OcrConfig {
            input: PathBuf::from("scan.pdf"),
            output: PathBuf::from("out.pdf"),
            dpi: 5,
            ..Default::default()
        };
        let err = make_searchable_pdf(&config).await.unwrap_err();
        assert!(matches!(err, FolioError::Validation { .. }));
    }
}
