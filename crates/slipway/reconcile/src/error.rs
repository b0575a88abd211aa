//! Error types for slipway-reconcile.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration reconciliation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An entry with the same name exists with a different value and the
    /// caller did not consent to overwriting it.
    #[error("entry '{name}' already exists in {path} with a different value")]
    ExistingEntryConflict { name: String, path: PathBuf },

    /// The target file or its directory cannot be written.
    #[error("write denied for {path}")]
    WriteDenied { path: PathBuf },

    /// The target document could not be parsed.
    ///
    /// Surfaced, never swallowed: the reconciler recovers by rebuilding
    /// a fresh document, but the loss must always be reported.
    #[error("failed to parse {path}: {reason}")]
    ParseFailure { path: PathBuf, reason: String },

    /// Serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The platform's configuration directory could not be resolved.
    #[error("cannot resolve configuration path: {0}")]
    PathResolution(String),
}

impl ConfigError {
    /// Classify an I/O error against the path it occurred on.
    pub(crate) fn from_io(path: &std::path::Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            ConfigError::WriteDenied {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io(err)
        }
    }
}

/// Result type for reconciliation operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
