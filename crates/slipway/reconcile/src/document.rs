//! In-memory representation of a user-owned JSON document.
//!
//! The document's recognized shape is a top-level JSON object; every key
//! the harness does not own is opaque and round-trips through load and
//! write untouched. An absent backing file synthesizes an empty
//! document; a malformed one is reported, never silently discarded.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{ConfigError, ConfigResult};

/// A JSON configuration document bound to a path.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    path: PathBuf,
    root: Map<String, Value>,
}

/// Outcome of loading a document from disk.
#[derive(Debug)]
pub struct LoadedDocument {
    /// The document (empty if the file was absent or unparseable).
    pub document: ConfigDocument,

    /// Whether the backing file existed.
    pub existed: bool,

    /// Parse failure detail, when the existing file was unreadable as a
    /// JSON object. The caller decides how to surface the loss.
    pub parse_error: Option<String>,
}

impl ConfigDocument {
    /// An empty document bound to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            root: Map::new(),
        }
    }

    /// Load the document at `path`.
    ///
    /// Absent file: an empty document (`existed == false`). Present but
    /// unparseable (or not a JSON object): an empty document with
    /// `parse_error` set — reconciliation continues lossily from it.
    pub fn load(path: &Path) -> ConfigResult<LoadedDocument> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LoadedDocument {
                    document: Self::empty(path),
                    existed: false,
                    parse_error: None,
                });
            }
            // Read failures are plain I/O errors; WriteDenied is
            // reserved for the write path.
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if raw.trim().is_empty() {
            return Ok(LoadedDocument {
                document: Self::empty(path),
                existed: true,
                parse_error: None,
            });
        }

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(root)) => Ok(LoadedDocument {
                document: Self {
                    path: path.to_path_buf(),
                    root,
                },
                existed: true,
                parse_error: None,
            }),
            Ok(other) => {
                let reason = format!("expected a JSON object, found {}", value_kind(&other));
                warn!(path = %path.display(), %reason, "configuration document has unexpected shape");
                Ok(LoadedDocument {
                    document: Self::empty(path),
                    existed: true,
                    parse_error: Some(reason),
                })
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(path = %path.display(), %reason, "configuration document is unparseable");
                Ok(LoadedDocument {
                    document: Self::empty(path),
                    existed: true,
                    parse_error: Some(reason),
                })
            }
        }
    }

    /// The path this document is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Top-level object, read-only.
    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Top-level object, mutable.
    pub fn root_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.root
    }

    /// Write the document back atomically.
    ///
    /// Serializes with stable pretty formatting into a temp file in the
    /// target directory, then renames over the destination, so the
    /// original content survives any failure before the rename.
    pub fn write_atomic(&self) -> ConfigResult<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&parent).map_err(|e| ConfigError::from_io(&parent, e))?;

        let mut serialized = serde_json::to_string_pretty(&Value::Object(self.root.clone()))?;
        serialized.push('\n');

        let mut tmp = tempfile::NamedTempFile::new_in(&parent)
            .map_err(|e| ConfigError::from_io(&parent, e))?;
        tmp.write_all(serialized.as_bytes())
            .map_err(|e| ConfigError::from_io(&self.path, e))?;
        tmp.persist(&self.path)
            .map_err(|e| ConfigError::from_io(&self.path, e.error))?;
        Ok(())
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_file_synthesizes_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let loaded = ConfigDocument::load(&path).unwrap();
        assert!(!loaded.existed);
        assert!(loaded.parse_error.is_none());
        assert!(loaded.document.root().is_empty());
    }

    #[test]
    fn test_unknown_keys_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"theme":"dark","servers":{},"editor.fontSize":14}"#,
        )
        .unwrap();

        let loaded = ConfigDocument::load(&path).unwrap();
        loaded.document.write_atomic().unwrap();

        let reread: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reread["theme"], "dark");
        assert_eq!(reread["editor.fontSize"], 14);
        assert_eq!(reread["servers"], json!({}));
    }

    #[test]
    fn test_malformed_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        let loaded = ConfigDocument::load(&path).unwrap();
        assert!(loaded.existed);
        assert!(loaded.parse_error.is_some());
        assert!(loaded.document.root().is_empty());
    }

    #[test]
    fn test_unreadable_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::create_dir(&path).unwrap();

        let err = ConfigDocument::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_non_object_root_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let loaded = ConfigDocument::load(&path).unwrap();
        assert!(loaded.parse_error.unwrap().contains("array"));
    }
}
