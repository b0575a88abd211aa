//! Filesystem artifacts produced by the harness.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A timestamped copy of a user-owned file, taken before overwriting it.
///
/// Backups are created at most once per reconciliation attempt and are
/// never deleted by the harness; retention belongs to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Path of the file that was backed up.
    pub original_path: PathBuf,

    /// Path of the backup copy.
    pub backup_path: PathBuf,

    /// When the backup was taken.
    pub created_at: DateTime<Utc>,
}

/// A matched certificate/private-key pair on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateBundle {
    /// PEM-encoded certificate path.
    pub cert_path: PathBuf,

    /// PEM-encoded private key path.
    pub key_path: PathBuf,

    /// Subject name the certificate is bound to.
    pub subject: String,

    /// Validity window in days.
    pub validity_days: u32,
}
