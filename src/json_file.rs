//! Whole-file JSON persistence.
//!
//! Every write goes to a temporary file in the target's directory and is
//! renamed over the target, so readers see either the old or the new file
//! and never a partial one.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors from reading or writing a JSON file.
#[derive(Debug, Error)]
pub enum JsonFileError {
    /// The file could not be read, written, or renamed into place.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file's contents are not the expected JSON shape.
    #[error("malformed JSON in {}: {source}", path.display())]
    Parse {
        /// The file being parsed.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// The value could not be serialized.
    #[error("failed to serialize {}: {source}", path.display())]
    Serialize {
        /// The file being written.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
}

/// Read and deserialize `path`.
///
/// # Errors
/// Returns [`JsonFileError::Io`] if the file cannot be read (including when
/// it does not exist) and [`JsonFileError::Parse`] if it is malformed.
pub fn read<T: DeserializeOwned>(path: &Path) -> Result<T, JsonFileError> {
    let contents = std::fs::read_to_string(path).map_err(|source| JsonFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| JsonFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read `path` if it exists.
///
/// # Errors
/// As [`read`], except a missing file yields `Ok(None)`.
pub fn read_opt<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, JsonFileError> {
    match read(path) {
        Ok(value) => Ok(Some(value)),
        Err(JsonFileError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Render `value` as 2-space-indented JSON with a trailing newline.
///
/// # Errors
/// Returns the serializer's error.
pub fn to_pretty<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    Ok(text)
}

/// Serialize `value` and atomically replace `path` with it.
///
/// The parent directory must already exist.
///
/// # Errors
/// Returns [`JsonFileError`] on serialization or I/O failure.
pub fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), JsonFileError> {
    let text = to_pretty(value).map_err(|source| JsonFileError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    let io_err = |source| JsonFileError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(text.as_bytes()).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
