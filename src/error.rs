//! Error taxonomy for loading files and managing traces.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// All errors raised by the loader registry and the trace store.
///
/// Every variant carries enough context (path, key, label or field) to be
/// shown to the user as-is.
#[derive(Debug, Error)]
pub enum Error {
    /// No transform registered for the `(format, data type)` key.
    #[error("no loader registered for format '{format}' with data type '{}'", .data_type.as_deref().unwrap_or("<default>"))]
    UnsupportedFormat {
        format: String,
        data_type: Option<String>,
    },

    /// Source file does not exist.
    #[error("file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// Any other failure while reading the source file.
    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content does not match what the transform expects.
    #[error("malformed data in {}: {reason}", .path.display())]
    MalformedData { path: PathBuf, reason: String },

    /// Label collision on add / rename.
    #[error("a trace labelled '{0}' already exists")]
    DuplicateLabel(String),

    /// Operation referenced an unknown trace label.
    #[error("no trace labelled '{0}'")]
    NotFound(String),

    /// Style field outside its allowed range.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
}

/// Result type for loader and trace operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an I/O error, splitting out the "file does not exist" case.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Error::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        Error::MalformedData {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// A `MalformedData` error naming every missing column.
    pub fn missing_columns<S: AsRef<str>>(path: &Path, missing: &[S]) -> Self {
        let names: Vec<&str> = missing.iter().map(|s| s.as_ref()).collect();
        Self::malformed(path, format!("missing column(s): {}", names.join(", ")))
    }

    /// Check if this is an unknown-label error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if the source file could not be read at all.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::FileNotFound { .. } | Error::Io { .. })
    }
}
