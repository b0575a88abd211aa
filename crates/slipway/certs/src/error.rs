//! Error types for slipway-certs.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while provisioning a certificate bundle.
#[derive(Debug, Error)]
pub enum CertError {
    /// Key or certificate generation failed.
    #[error("certificate tooling unavailable: {0}")]
    ToolingUnavailable(String),

    /// The target directory or files cannot be written.
    #[error("write denied for {path}")]
    WriteDenied { path: PathBuf },

    /// Other I/O failure.
    #[error("certificate I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CertError {
    /// Classify an I/O error against the path it occurred on.
    pub(crate) fn from_io(path: &std::path::Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            CertError::WriteDenied {
                path: path.to_path_buf(),
            }
        } else {
            CertError::Io(err)
        }
    }
}

/// Result type for certificate operations.
pub type CertResult<T> = Result<T, CertError>;
