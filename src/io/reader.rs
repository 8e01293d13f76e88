//! Text file reading and writing.

use crate::error::{IoError, Result};
use std::path::Path;

/// Maximum size of a text file read into memory (1MB).
///
/// Prompt templates are a few kilobytes; anything larger is a mistake.
const MAX_TEXT_FILE_SIZE: u64 = 1024 * 1024;

/// Reads a UTF-8 text file.
///
/// # Errors
///
/// Returns `FileNotFound` if the path does not exist and `ReadFailed` if it
/// cannot be read, is larger than 1MB, or is not valid UTF-8.
///
/// # Examples
///
/// ```no_run
/// use transcript_qa::io::read_text_file;
///
/// let template = read_text_file("system.md").unwrap();
/// ```
pub fn read_text_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path_ref = path.as_ref();
    let path_str = path_ref.to_string_lossy().to_string();

    if !path_ref.exists() {
        return Err(IoError::FileNotFound { path: path_str }.into());
    }

    let size = std::fs::metadata(path_ref)
        .map_err(|e| IoError::ReadFailed {
            path: path_str.clone(),
            reason: e.to_string(),
        })?
        .len();

    if size > MAX_TEXT_FILE_SIZE {
        return Err(IoError::ReadFailed {
            path: path_str,
            reason: format!("file too large: {size} bytes (max: {MAX_TEXT_FILE_SIZE} bytes)"),
        }
        .into());
    }

    std::fs::read_to_string(path_ref).map_err(|e| {
        IoError::ReadFailed {
            path: path_str,
            reason: e.to_string(),
        }
        .into()
    })
}

/// Writes content to a file, creating parent directories if needed.
///
/// # Errors
///
/// Returns an error if directory creation or file writing fails.
pub fn write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path_ref = path.as_ref();
    let path_str = path_ref.to_string_lossy().to_string();

    if let Some(parent) = path_ref.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| IoError::DirectoryFailed {
            path: parent.to_string_lossy().to_string(),
            reason: e.to_string(),
        })?;
    }

    std::fs::write(path_ref, content).map_err(|e| IoError::WriteFailed {
        path: path_str,
        reason: e.to_string(),
    })?;

    Ok(())
}

/// Writes content to a file only if it does not exist yet.
///
/// Returns `true` if the file was written and `false` if it was left alone.
///
/// # Errors
///
/// Returns an error if directory creation or file writing fails.
pub fn write_new_file<P: AsRef<Path>>(path: P, content: &str) -> Result<bool> {
    let path_ref = path.as_ref();
    if path_ref.exists() {
        return Ok(false);
    }
    write_file(path_ref, content)?;
    Ok(true)
}
