//! File I/O utilities.
//!
//! Directory traversal for the keyword search and atomic output writes shared
//! by every procedure that produces a file.

use crate::{FolioError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Read a file synchronously.
///
/// # Errors
///
/// Returns `FolioError::Io` for I/O errors (these always bubble up).
pub fn read_file_sync(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    std::fs::read(path.as_ref()).map_err(FolioError::Io)
}

/// Validate that an input file exists and is a regular file.
///
/// A missing file is reported as `FolioError::Io` with `NotFound` so callers
/// see the same error they would get from opening it.
pub fn validate_input_file(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path).map_err(|e| {
        FolioError::Io(std::io::Error::new(
            e.kind(),
            format!("Cannot access input file {}: {}", path.display(), e),
        ))
    })?;

    if !metadata.is_file() {
        return Err(FolioError::validation(format!(
            "Input is not a file: {}",
            path.display()
        )));
    }
    Ok(())
}

/// Traverse a directory tree and return every file accepted by `filter`.
///
/// Files are returned in the order the filesystem yields them; that order is
/// platform dependent and not sorted. Symlinked files are included,
/// symlinked directories are not descended into.
///
/// # Errors
///
/// - `FolioError::Io` if the root does not exist or any directory in the
///   tree cannot be read.
/// - `FolioError::Validation` if the root is not a directory.
pub fn traverse_directory<F>(dir: impl AsRef<Path>, recursive: bool, filter: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool,
{
    let dir = dir.as_ref();
    let metadata = std::fs::metadata(dir).map_err(|e| {
        FolioError::Io(std::io::Error::new(
            e.kind(),
            format!("Cannot access directory {}: {}", dir.display(), e),
        ))
    })?;

    if !metadata.is_dir() {
        return Err(FolioError::validation(format!(
            "Path is not a directory: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    traverse_directory_impl(dir, recursive, &filter, &mut files)?;
    Ok(files)
}

fn traverse_directory_impl<F>(dir: &Path, recursive: bool, filter: &F, files: &mut Vec<PathBuf>) -> Result<()>
where
    F: Fn(&Path) -> bool,
{
    let entries = std::fs::read_dir(dir).map_err(FolioError::Io)?;

    for entry in entries {
        let entry = entry.map_err(FolioError::Io)?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(FolioError::Io)?;

        if file_type.is_dir() {
            if recursive {
                traverse_directory_impl(&path, recursive, filter, files)?;
            }
        } else if (file_type.is_file() || (file_type.is_symlink() && path.is_file())) && filter(&path) {
            files.push(path);
        }
    }

    Ok(())
}

/// Recursively collect files whose name ends with `suffix`.
///
/// The comparison is case-sensitive and applies to the file name only, so
/// `report.pdf` matches `.pdf` but `report.PDF` does not.
pub fn find_files_by_suffix(dir: impl AsRef<Path>, suffix: &str) -> Result<Vec<PathBuf>> {
    traverse_directory(dir, true, |path: &Path| {
        path.file_name()
            .map(|name| name.to_string_lossy().ends_with(suffix))
            .unwrap_or(false)
    })
}

/// Write `bytes` to `path` in one step.
///
/// The content goes to a temporary file in the target directory which is then
/// renamed over `path`, so a failed write never leaves a partial output. The
/// target directory must already exist.
pub fn write_atomic(path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let parent = output_parent(path);

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| {
        FolioError::Io(std::io::Error::new(
            e.kind(),
            format!("Cannot write to directory {}: {}", parent.display(), e),
        ))
    })?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| FolioError::Io(e.error))?;

    tracing::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Create a temporary file next to `path` that can later be persisted over it.
///
/// Used when an external tool writes the output itself. `suffix` keeps the
/// extension tools use to pick a format.
pub fn temp_output_file(path: impl AsRef<Path>, suffix: &str) -> Result<tempfile::NamedTempFile> {
    let parent = output_parent(path.as_ref());
    tempfile::Builder::new()
        .prefix(".folio-")
        .suffix(suffix)
        .tempfile_in(parent)
        .map_err(|e| {
            FolioError::Io(std::io::Error::new(
                e.kind(),
                format!("Cannot write to directory {}: {}", parent.display(), e),
            ))
        })
}

/// Create an output directory (and its parents) if missing.
pub fn ensure_output_dir(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|e| {
        FolioError::Io(std::io::Error::new(
            e.kind(),
            format!("Cannot create output directory {}: {}", dir.display(), e),
        ))
    })
}

fn output_parent(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_read_file_sync() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.txt");
        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"test content").unwrap();

        let content = read_file_sync(&file_path).unwrap();
        assert_eq!(content, b"test content");
    }

    #[test]
    fn test_read_file_sync_io_error() {
        let result = read_file_sync("/nonexistent/file.txt");
        assert!(matches!(result.unwrap_err(), FolioError::Io(_)));
    }

    #[test]
    fn test_validate_input_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("input.pdf");
        File::create(&file_path).unwrap();

        assert!(validate_input_file(&file_path).is_ok());
        assert!(matches!(
            validate_input_file(dir.path().join("missing.pdf")).unwrap_err(),
            FolioError::Io(_)
        ));
        assert!(matches!(
            validate_input_file(dir.path()).unwrap_err(),
            FolioError::Validation { .. }
        ));
    }

    #[test]
    fn test_traverse_directory_non_recursive() {
        let dir = tempdir().unwrap();

        File::create(dir.path().join("file1.txt")).unwrap();
        File::create(dir.path().join("file2.pdf")).unwrap();
        std::fs::create_dir(dir.path().join("subdir")).unwrap();
        File::create(dir.path().join("subdir").join("file3.txt")).unwrap();

        let files = traverse_directory(dir.path(), false, |_: &Path| true).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_traverse_directory_recursive() {
        let dir = tempdir().unwrap();

        File::create(dir.path().join("file1.txt")).unwrap();
        std::fs::create_dir_all(dir.path().join("a").join("b")).unwrap();
        File::create(dir.path().join("a").join("file2.pdf")).unwrap();
        File::create(dir.path().join("a").join("b").join("file3.pdf")).unwrap();

        let files = traverse_directory(dir.path(), true, |_: &Path| true).unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_find_files_by_suffix_is_case_sensitive() {
        let dir = tempdir().unwrap();

        File::create(dir.path().join("paper.pdf")).unwrap();
        File::create(dir.path().join("scan.PDF")).unwrap();
        File::create(dir.path().join("notes.pdf.txt")).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        File::create(dir.path().join("nested").join("deep.pdf")).unwrap();

        let mut names: Vec<String> = find_files_by_suffix(dir.path(), ".pdf")
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();

        assert_eq!(names, vec!["deep.pdf", "paper.pdf"]);
    }

    #[test]
    fn test_traverse_directory_missing_root_is_io_error() {
        let result = traverse_directory("/nonexistent/directory", true, |_: &Path| true);
        assert!(matches!(result.unwrap_err(), FolioError::Io(_)));
    }

    #[test]
    fn test_traverse_directory_file_not_dir() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.txt");
        File::create(&file_path).unwrap();

        let result = traverse_directory(&file_path, true, |_: &Path| true);
        assert!(matches!(result.unwrap_err(), FolioError::Validation { .. }));
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.bin");

        write_atomic(&target, b"first").unwrap();
        write_atomic(&target, b"second").unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"second");
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_write_atomic_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("missing").join("out.bin");

        let result = write_atomic(&target, b"data");
        assert!(matches!(result.unwrap_err(), FolioError::Io(_)));
        assert!(!target.exists());
    }

    #[test]
    fn test_temp_output_file_keeps_suffix() {
        let dir = tempdir().unwrap();
        let temp = temp_output_file(dir.path().join("clip.gif"), ".gif").unwrap();
        assert!(temp.path().to_string_lossy().ends_with(".gif"));
        assert_eq!(temp.path().parent().unwrap(), dir.path());
    }

    #[test]
    fn test_ensure_output_dir_creates_parents() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_output_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
