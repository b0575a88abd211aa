//! Backup manager.
//!
//! Snapshots a user-owned file before any destructive write. Backups are
//! created only when the original pre-exists, at most once per
//! reconciliation attempt, and are never deleted here.

use std::fs;
use std::path::Path;

use chrono::{Local, Utc};
use tracing::info;

use slipway_types::BackupRecord;

use crate::error::{ConfigError, ConfigResult};

/// Creates timestamped copies of files about to be overwritten.
#[derive(Debug, Default)]
pub struct BackupManager;

impl BackupManager {
    pub fn new() -> Self {
        Self
    }

    /// Snapshot `path` if it exists.
    ///
    /// The copy lands next to the original as
    /// `<path>.backup_<YYYYmmdd_HHMMSS>`. Returns `None` when there is
    /// nothing to back up.
    pub fn backup(&self, path: &Path) -> ConfigResult<Option<BackupRecord>> {
        if !path.exists() {
            return Ok(None);
        }

        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let mut file_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        file_name.push(format!(".backup_{}", stamp));
        let backup_path = path.with_file_name(file_name);

        fs::copy(path, &backup_path).map_err(|e| ConfigError::from_io(&backup_path, e))?;
        info!(
            original = %path.display(),
            backup = %backup_path.display(),
            "created configuration backup"
        );

        Ok(Some(BackupRecord {
            original_path: path.to_path_buf(),
            backup_path,
            created_at: Utc::now(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_copies_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"theme":"dark"}"#).unwrap();

        let record = BackupManager::new().backup(&path).unwrap().unwrap();

        assert_eq!(record.original_path, path);
        assert_eq!(
            fs::read(&record.backup_path).unwrap(),
            fs::read(&path).unwrap()
        );
        let name = record.backup_path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("config.json.backup_"));
    }

    #[test]
    fn test_no_backup_for_absent_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let record = BackupManager::new().backup(&path).unwrap();
        assert!(record.is_none());
    }
}
