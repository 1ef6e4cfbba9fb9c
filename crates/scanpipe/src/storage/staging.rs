//! Staging directory handling and page-file ordering.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;

use crate::error::StorageError;

static INDEX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[0-9]+").expect("valid index pattern"));

/// Creates `path` and its parents if missing.
pub fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// Removes `path` recursively. A directory that is already gone is not an error.
pub fn remove_directory(path: &Path) -> Result<(), StorageError> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::RemoveDirectory {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Extracts the page index of a staged file: the first run of decimal digits
/// in the file stem. No digits, or digits that overflow, yield 0.
pub fn parse_index(path: &Path) -> u64 {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();

    match INDEX_PATTERN.find(&stem) {
        Some(digits) => match digits.as_str().parse::<u64>() {
            Ok(index) => index,
            Err(e) => {
                warn!("error parsing batch index of {}: {}", path.display(), e);
                0
            }
        },
        None => 0,
    }
}

/// Stable sort by page index; files with equal indices keep their order.
pub fn sort_by_index(files: &mut [PathBuf]) {
    files.sort_by_cached_key(|path| parse_index(path));
}

/// Lists files in `dir` matching `pattern`, ordered by page index.
pub fn ordered_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, StorageError> {
    let full_pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        pattern
    );

    let entries = glob::glob(&full_pattern).map_err(|e| StorageError::Pattern {
        pattern: full_pattern.clone(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => files.push(path),
            Err(e) => warn!("skipping unreadable staged file: {}", e),
        }
    }

    sort_by_index(&mut files);
    debug!("{} staged files match {}", files.len(), full_pattern);

    Ok(files)
}
