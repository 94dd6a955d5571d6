//! Reading and writing documents on disk.
//!
//! The format is chosen by file extension. Writes are atomic: the new
//! content goes to a temporary file in the same directory, is synced, then
//! renamed over the target.

use crate::value::convert::{from_json_str, from_toml_str, to_json_string_pretty, to_toml_string};
use crate::value::{ConvertError, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported document format for {path} (expected .json or .toml)")]
    UnsupportedFormat { path: PathBuf },

    #[error("{path}: {source}")]
    Convert {
        path: PathBuf,
        #[source]
        source: ConvertError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Toml,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Format::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Format::Toml),
            _ => Err(DocumentError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn parse(self, input: &str) -> Result<Value, ConvertError> {
        match self {
            Format::Json => from_json_str(input),
            Format::Toml => from_toml_str(input),
        }
    }

    pub fn render(self, value: &Value) -> Result<String, ConvertError> {
        match self {
            Format::Json => to_json_string_pretty(value).map(|mut out| {
                out.push('\n');
                out
            }),
            Format::Toml => to_toml_string(value),
        }
    }
}

/// A document loaded from disk, with the raw text it was parsed from.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub format: Format,
    pub source: String,
    pub value: Value,
}

impl Document {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let source = fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value = format
            .parse(&source)
            .map_err(|source| DocumentError::Convert {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            format,
            source,
            value,
        })
    }

    /// Render `value` in this document's format.
    pub fn render(&self, value: &Value) -> Result<String, DocumentError> {
        self.format
            .render(value)
            .map_err(|source| DocumentError::Convert {
                path: self.path.clone(),
                source,
            })
    }

    /// Replace the file on disk with `content`.
    pub fn write(&self, content: &str) -> Result<(), DocumentError> {
        atomic_write(&self.path, content.as_bytes()).map_err(|source| DocumentError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or the target is left unchanged.
pub fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    // Same directory keeps the rename on one filesystem
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
