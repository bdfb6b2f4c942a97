//! Folio command-line interface.
//!
//! Every subcommand reads its section of the configuration file (`--config`,
//! or `folio.toml` found in the working directory or an ancestor) and lets
//! command-line flags override individual settings.

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use folio::core::config::{
    FolioConfig, GifConfig, ImageExtractionConfig, KeywordSearchConfig, LatexConfig, OcrConfig, PageSize,
    TableScrapeConfig,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human readable summary
    Text,
    /// JSON report on stdout
    Json,
}

#[derive(Parser)]
#[command(name = "folio", version, about = "Research document toolkit", long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON); defaults to a discovered folio.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the PDFs under a directory that mention any keyword
    Search {
        /// Directory searched recursively
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Output spreadsheet
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keyword or regular expression (repeatable)
        #[arg(short, long = "keyword")]
        keywords: Vec<String>,

        /// Match keywords as literal text
        #[arg(long)]
        literal: bool,

        /// Process files in sorted path order
        #[arg(long)]
        sort: bool,

        /// File name suffix of candidate documents
        #[arg(long)]
        suffix: Option<String>,

        /// Only read the first N pages of each document
        #[arg(long)]
        max_pages: Option<u32>,
    },

    /// OCR an image-only PDF into a searchable PDF
    Ocr {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Tesseract language, e.g. "eng" or "eng+deu"
        #[arg(short, long)]
        language: Option<String>,

        /// Resolution passed to tesseract
        #[arg(long)]
        dpi: Option<u32>,

        /// Render pages at DPI instead of the fixed page size
        #[arg(long)]
        render_at_dpi: bool,

        /// Fixed render size in pixels, e.g. 1654x2340
        #[arg(long, value_parser = parse_page_size, conflicts_with = "render_at_dpi")]
        page_size: Option<PageSize>,

        #[arg(long)]
        tesseract: Option<PathBuf>,

        /// Per-page timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Copy tables from PDF pages into a spreadsheet
    Tables {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// "all" or 1-based pages and ranges, e.g. "1,3-5" or "2-end"
        #[arg(short, long)]
        pages: Option<String>,

        #[arg(long)]
        column_threshold: Option<u32>,

        #[arg(long)]
        row_threshold_ratio: Option<f64>,

        #[arg(long)]
        min_confidence: Option<f64>,
    },

    /// Save the images embedded in a PDF as PNG files
    Images {
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory receiving p<page>-<xref>.png files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Speed up a video and save it as an animated GIF
    Gif {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Playback speed factor
        #[arg(short, long)]
        speed: Option<f64>,

        #[arg(long)]
        fps: Option<u32>,

        /// Output width in pixels; height keeps the aspect ratio
        #[arg(long)]
        width: Option<u32>,

        #[arg(long)]
        ffmpeg: Option<PathBuf>,

        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Render every sheet of a workbook as a LaTeX table
    Latex {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Float placement specifier, e.g. "ht" or "H"
        #[arg(long)]
        placement: Option<String>,

        /// Keep LaTeX special characters unescaped
        #[arg(long)]
        no_escape: bool,
    },
}

fn parse_page_size(raw: &str) -> std::result::Result<PageSize, String> {
    let (width, height) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", raw))?;
    let width = width.trim().parse().map_err(|_| format!("invalid width '{}'", width))?;
    let height = height.trim().parse().map_err(|_| format!("invalid height '{}'", height))?;
    Ok(PageSize { width, height })
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("folio={level}")));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<FolioConfig> {
    match path {
        Some(path) => {
            let config = FolioConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::debug!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => match FolioConfig::discover().context("Failed to discover configuration")? {
            Some(config) => {
                tracing::debug!("Using discovered folio.toml");
                Ok(config)
            }
            None => {
                tracing::debug!("No configuration file found, using defaults");
                Ok(FolioConfig::default())
            }
        },
    }
}

fn print_report<T: Serialize>(format: OutputFormat, report: &T, text: impl FnOnce() -> String) -> Result<()> {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(report).context("Failed to serialize report")?
        ),
        OutputFormat::Text => println!("{}", text()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let file_config = load_config(cli.config.as_ref())?;
    let format = cli.format;

    match cli.command {
        Commands::Search {
            root,
            output,
            keywords,
            literal,
            sort,
            suffix,
            max_pages,
        } => {
            let mut config: KeywordSearchConfig = file_config.search.unwrap_or_default();
            if let Some(root) = root {
                config.root = root;
            }
            if let Some(output) = output {
                config.output = output;
            }
            if !keywords.is_empty() {
                config.keywords = keywords;
            }
            if let Some(suffix) = suffix {
                config.suffix = suffix;
            }
            if max_pages.is_some() {
                config.max_pages = max_pages;
            }
            config.literal |= literal;
            config.sort |= sort;

            let report = folio::search::run_keyword_search(&config).context("Keyword search failed")?;
            print_report(format, &report, || {
                let mut lines: Vec<String> = report.matched_paths().map(|p| p.display().to_string()).collect();
                lines.push(format!(
                    "{} of {} document(s) matched, {} skipped; wrote {}",
                    report.matched_count(),
                    report.len(),
                    report.skipped_count(),
                    config.output.display()
                ));
                lines.join("\n")
            })
        }

        Commands::Ocr {
            input,
            output,
            language,
            dpi,
            render_at_dpi,
            page_size,
            tesseract,
            timeout,
        } => {
            let mut config: OcrConfig = file_config.ocr.unwrap_or_default();
            if let Some(input) = input {
                config.input = input;
            }
            if let Some(output) = output {
                config.output = output;
            }
            if let Some(language) = language {
                config.language = language;
            }
            if let Some(dpi) = dpi {
                config.dpi = dpi;
            }
            if render_at_dpi {
                config.page_size = None;
            } else if page_size.is_some() {
                config.page_size = page_size;
            }
            if tesseract.is_some() {
                config.tesseract_path = tesseract;
            }
            if let Some(timeout) = timeout {
                config.timeout_secs = timeout;
            }

            let report = folio::ocr::make_searchable_pdf(&config)
                .await
                .with_context(|| format!("OCR of {} failed", config.input.display()))?;
            print_report(format, &report, || {
                format!("Wrote {} ({} page(s))", report.output.display(), report.page_count)
            })
        }

        Commands::Tables {
            input,
            output,
            pages,
            column_threshold,
            row_threshold_ratio,
            min_confidence,
        } => {
            let mut config: TableScrapeConfig = file_config.tables.unwrap_or_default();
            if let Some(input) = input {
                config.input = input;
            }
            if let Some(output) = output {
                config.output = output;
            }
            if let Some(pages) = pages {
                config.pages = pages;
            }
            if let Some(threshold) = column_threshold {
                config.column_threshold = threshold;
            }
            if let Some(ratio) = row_threshold_ratio {
                config.row_threshold_ratio = ratio;
            }
            if let Some(confidence) = min_confidence {
                config.min_confidence = confidence;
            }

            let report = folio::tables::scrape_tables(&config)
                .with_context(|| format!("Table scraping of {} failed", config.input.display()))?;
            print_report(format, &report, || {
                format!(
                    "Wrote {} table(s), {} row(s) to {}",
                    report.tables.len(),
                    report.row_count(),
                    report.output.display()
                )
            })
        }

        Commands::Images { input, output_dir } => {
            let mut config: ImageExtractionConfig = file_config.images.unwrap_or_default();
            if let Some(input) = input {
                config.input = input;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }

            let report = folio::pdf::extract_images(&config)
                .with_context(|| format!("Image extraction from {} failed", config.input.display()))?;
            print_report(format, &report, || {
                let mut lines: Vec<String> = report.extracted.iter().map(|i| i.path.display().to_string()).collect();
                for skipped in &report.skipped {
                    lines.push(format!(
                        "skipped p{}-{}: {}",
                        skipped.page_index, skipped.object_number, skipped.reason
                    ));
                }
                lines.push(format!(
                    "{} image(s) written, {} skipped",
                    report.extracted.len(),
                    report.skipped.len()
                ));
                lines.join("\n")
            })
        }

        Commands::Gif {
            input,
            output,
            speed,
            fps,
            width,
            ffmpeg,
            timeout,
        } => {
            let mut config: GifConfig = file_config.gif.unwrap_or_default();
            if let Some(input) = input {
                config.input = input;
            }
            if let Some(output) = output {
                config.output = output;
            }
            if let Some(speed) = speed {
                config.speed = speed;
            }
            if fps.is_some() {
                config.fps = fps;
            }
            if width.is_some() {
                config.width = width;
            }
            if ffmpeg.is_some() {
                config.ffmpeg_path = ffmpeg;
            }
            if let Some(timeout) = timeout {
                config.timeout_secs = timeout;
            }

            folio::video::convert_to_gif(&config)
                .await
                .with_context(|| format!("GIF conversion of {} failed", config.input.display()))?;
            print_report(format, &config.output, || format!("Wrote {}", config.output.display()))
        }

        Commands::Latex {
            input,
            output_dir,
            placement,
            no_escape,
        } => {
            let mut config: LatexConfig = file_config.latex.unwrap_or_default();
            if let Some(input) = input {
                config.input = input;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(placement) = placement {
                config.placement = placement;
            }
            if no_escape {
                config.escape = false;
            }

            let written = folio::latex::convert_workbook(&config)
                .with_context(|| format!("LaTeX conversion of {} failed", config.input.display()))?;
            if written.is_empty() {
                bail!("{} has no non-empty sheets", config.input.display());
            }
            print_report(format, &written, || {
                written
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_page_size() {
        assert_eq!(
            parse_page_size("1654x2340").unwrap(),
            PageSize {
                width: 1654,
                height: 2340
            }
        );
        assert!(parse_page_size("1654").is_err());
        assert!(parse_page_size("ax2").is_err());
    }

    #[test]
    fn test_search_flags() {
        let cli = Cli::parse_from([
            "folio", "-vv", "search", "-r", "papers", "-o", "out.xlsx", "-k", "hotel load", "-k", "base load", "--sort",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Search {
                root, keywords, sort, ..
            } => {
                assert_eq!(root, Some(PathBuf::from("papers")));
                assert_eq!(keywords, vec!["hotel load", "base load"]);
                assert!(sort);
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_global_format_after_subcommand() {
        let cli = Cli::parse_from(["folio", "latex", "-i", "book.xlsx", "--format", "json"]);
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
