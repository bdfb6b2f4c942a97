use super::error::PdfError;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use std::sync::Mutex;

/// Environment variable naming a directory that holds the pdfium shared library.
pub const PDFIUM_PATH_ENV: &str = "FOLIO_PDFIUM_PATH";

/// Cached outcome of the first binding attempt.
///
/// Bindings themselves are not `Clone`, so only the library location (or the
/// failure) is cached and fresh bindings are created from it on every call.
enum InitializationState {
    Uninitialized,
    Initialized { lib_dir: Option<PathBuf> },
    Failed(String),
}

static PDFIUM_STATE: Lazy<Mutex<InitializationState>> = Lazy::new(|| Mutex::new(InitializationState::Uninitialized));

fn bind_from(lib_dir: Option<&PathBuf>) -> Result<Box<dyn PdfiumLibraryBindings>, String> {
    match lib_dir {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            .map_err(|e| format!("Failed to bind pdfium from {}: {}", dir.display(), e)),
        None => Pdfium::bind_to_system_library().map_err(|e| format!("Failed to bind system pdfium: {}", e)),
    }
}

fn configured_lib_dir() -> Option<PathBuf> {
    std::env::var_os(PDFIUM_PATH_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Get pdfium bindings, initializing on first use.
///
/// The library is looked up in `FOLIO_PDFIUM_PATH` when set, otherwise in the
/// system library path. A failed first attempt is cached so later calls fail
/// fast with the same message. A missing library is always
/// [`PdfError::LibraryUnavailable`]; `map_err` wraps every other failure.
pub(crate) fn bind_pdfium(
    map_err: fn(String) -> PdfError,
    context: &'static str,
) -> Result<Box<dyn PdfiumLibraryBindings>, PdfError> {
    let mut state = PDFIUM_STATE
        .lock()
        .map_err(|e| map_err(format!("Failed to acquire lock on Pdfium state ({}): {}", context, e)))?;

    match &*state {
        InitializationState::Uninitialized => {
            let lib_dir = configured_lib_dir();
            match bind_from(lib_dir.as_ref()) {
                Ok(bindings) => {
                    tracing::debug!("Pdfium bound ({})", context);
                    *state = InitializationState::Initialized { lib_dir };
                    Ok(bindings)
                }
                Err(err) => {
                    *state = InitializationState::Failed(err.clone());
                    Err(PdfError::LibraryUnavailable(format!(
                        "Pdfium initialization failed ({}): {}",
                        context, err
                    )))
                }
            }
        }
        InitializationState::Failed(err) => Err(PdfError::LibraryUnavailable(format!(
            "Pdfium initialization previously failed ({}): {}",
            context, err
        ))),
        InitializationState::Initialized { lib_dir } => bind_from(lib_dir.as_ref())
            .map_err(|e| map_err(format!("Failed to create Pdfium bindings ({}): {}", context, e))),
    }
}

/// Create a `Pdfium` instance, mapping binding failures with `map_err`.
pub(crate) fn pdfium(map_err: fn(String) -> PdfError, context: &'static str) -> Result<Pdfium, PdfError> {
    bind_pdfium(map_err, context).map(Pdfium::new)
}

/// Whether pdfium can be bound in this environment.
pub fn pdfium_available() -> bool {
    bind_pdfium(PdfError::LibraryUnavailable, "availability check").is_ok()
}
