//! File system access that works around the classic 260 character path limit on Windows.

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use context_error::*;

use crate::XlError;

/// The maximal path length on Windows without the extended length prefix
pub const MAX_PATH: usize = 260;

/// Normalise a path so it can be opened even when it is longer than the platform limit. On Windows
/// absolute paths of at least [`MAX_PATH`] characters get the `\\?\` prefix, UNC paths
/// (`\\server\share`) get the `\\?\UNC\` prefix. On other platforms the path is returned as is.
pub fn normalize_long_path(path: impl AsRef<Path>) -> PathBuf {
    normalize_long_path_for(path.as_ref(), cfg!(windows))
}

/// Normalise a path as if running on Windows (`windows = true`) or not.
pub fn normalize_long_path_for(path: &Path, windows: bool) -> PathBuf {
    let text = path.to_string_lossy();
    if !windows || text.chars().count() < MAX_PATH || text.starts_with(r"\\?\") {
        return path.to_path_buf();
    }
    let text = text.replace('/', "\\");
    if let Some(unc) = text.strip_prefix(r"\\") {
        PathBuf::from(format!(r"\\?\UNC\{unc}"))
    } else if is_absolute_windows(&text) {
        PathBuf::from(format!(r"\\?\{text}"))
    } else {
        path.to_path_buf()
    }
}

fn is_absolute_windows(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() > 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'\\'
}

/// Open a file for reading
/// # Errors
/// If the file could not be opened, the error names the path.
pub fn open_file(path: impl AsRef<Path>) -> Result<File, XlError> {
    let path = path.as_ref();
    File::open(normalize_long_path(path)).map_err(|e| {
        BoxedError::new(
            BasicKind::Error,
            "Could not open file",
            e.to_string(),
            Context::default().source(path.to_string_lossy()).to_owned(),
        )
    })
}

/// Create (or truncate) a file for writing, any missing parent directories are created
/// # Errors
/// If the file could not be created, the error names the path.
pub fn create_file(path: impl AsRef<Path>) -> Result<File, XlError> {
    let path = path.as_ref();
    let error = |e: std::io::Error| {
        BoxedError::new(
            BasicKind::Error,
            "Could not create file",
            e.to_string(),
            Context::default().source(path.to_string_lossy()).to_owned(),
        )
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(normalize_long_path(parent)).map_err(error)?;
    }
    File::create(normalize_long_path(path)).map_err(error)
}

/// Read a whole (small) text file
/// # Errors
/// If the file could not be read, the error names the path.
pub fn read_to_string(path: impl AsRef<Path>) -> Result<String, XlError> {
    let path = path.as_ref();
    std::fs::read_to_string(normalize_long_path(path)).map_err(|e| {
        BoxedError::new(
            BasicKind::Error,
            "Could not read file",
            e.to_string(),
            Context::default().source(path.to_string_lossy()).to_owned(),
        )
    })
}

/// Build the error for an IO failure while working on the given path
pub fn io_error(path: &Path, error: &std::io::Error) -> XlError {
    BoxedError::new(
        BasicKind::Error,
        "Input/output error",
        error.to_string(),
        Context::default().source(path.to_string_lossy()).to_owned(),
    )
}

/// Get the file stem of a path as text, with `.gz` removed first
pub fn file_stem(path: &Path) -> String {
    let path = if path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
    {
        path.with_extension("")
    } else {
        path.to_path_buf()
    };
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
