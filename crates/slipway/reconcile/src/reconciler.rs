//! Configuration reconciler.
//!
//! Computes and applies a merge plan that inserts or updates the
//! harness-owned entries in a user-owned JSON document, taking a backup
//! before any destructive write and writing atomically so a failure
//! never leaves a partially written file behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, warn};

use slipway_types::{BackupRecord, ServiceDescriptor};

use crate::backup::BackupManager;
use crate::document::ConfigDocument;
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{existing_entry, merge_entries, MergeScope};

/// Container key for server entries in the registry document.
const SERVERS_KEY: &str = "servers";

/// Caller consent knobs for overwriting a conflicting entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// Overwrite a conflicting entry without asking.
    pub force: bool,

    /// Merging over an existing entry was explicitly requested.
    pub merge: bool,
}

/// Interactive consent seam.
///
/// The CLI backs this with a terminal prompt; in quiet or
/// non-interactive runs no prompt is attached and a conflict is a hard
/// failure.
pub trait ConflictPrompt: Send + Sync {
    /// Ask whether `name` in `path` may be overwritten.
    fn confirm_overwrite(&self, name: &str, path: &Path) -> bool;
}

/// Outcome of one reconciliation.
#[derive(Debug)]
pub struct ReconcileResult {
    /// Backup taken before the write, when the target pre-existed.
    pub backup: Option<BackupRecord>,

    /// Whether the document observably changed.
    pub changed: bool,

    /// Whether previous content could not be preserved (parse failure).
    pub lossy: bool,
}

/// Applies merge plans to reconciliation targets.
pub struct ConfigReconciler {
    options: ReconcileOptions,
    backups: BackupManager,
    prompt: Option<Arc<dyn ConflictPrompt>>,
}

impl ConfigReconciler {
    pub fn new(options: ReconcileOptions) -> Self {
        Self {
            options,
            backups: BackupManager::new(),
            prompt: None,
        }
    }

    /// Attach an interactive conflict prompt.
    pub fn with_prompt(mut self, prompt: Arc<dyn ConflictPrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Reconcile the server registry document: set
    /// `servers.<descriptor.name>` to the descriptor's rendered entry,
    /// leaving every sibling untouched.
    pub fn reconcile_servers(
        &self,
        path: &Path,
        descriptor: &ServiceDescriptor,
    ) -> ConfigResult<ReconcileResult> {
        let mut entries = Map::new();
        entries.insert(descriptor.name.clone(), descriptor.to_config_value());
        self.reconcile_with(path, MergeScope::Nested(SERVERS_KEY), &entries)
    }

    /// Reconcile the editor settings document: flat dotted keys at the
    /// top level, same merge discipline as the registry document.
    pub fn reconcile_settings(
        &self,
        path: &Path,
        entries: &Map<String, Value>,
    ) -> ConfigResult<ReconcileResult> {
        self.reconcile_with(path, MergeScope::Flat, entries)
    }

    fn reconcile_with(
        &self,
        path: &Path,
        scope: MergeScope<'_>,
        entries: &Map<String, Value>,
    ) -> ConfigResult<ReconcileResult> {
        let loaded = ConfigDocument::load(path)?;

        // Conflict gate runs before any backup or write: a refused
        // overwrite must leave no trace on disk.
        if loaded.existed && loaded.parse_error.is_none() {
            self.check_conflicts(path, loaded.document.root(), scope, entries)?;
        }

        let backup = if loaded.existed {
            self.backups.backup(path)?
        } else {
            None
        };

        let lossy = loaded.parse_error.is_some();
        if let Some(reason) = &loaded.parse_error {
            warn!(
                path = %path.display(),
                %reason,
                "previous content could not be preserved; rebuilding document from scratch"
            );
        }

        let mut document = loaded.document;
        let merged = merge_entries(document.root_mut(), scope, entries);
        document.write_atomic()?;

        let changed = merged || lossy;
        info!(
            path = %path.display(),
            changed,
            lossy,
            backup = backup.as_ref().map(|b| b.backup_path.display().to_string()),
            "reconciled configuration document"
        );

        Ok(ReconcileResult {
            backup,
            changed,
            lossy,
        })
    }

    /// Fail (or prompt) when an entry already exists with a different
    /// value and the caller did not consent to overwriting it.
    fn check_conflicts(
        &self,
        path: &Path,
        root: &Map<String, Value>,
        scope: MergeScope<'_>,
        entries: &Map<String, Value>,
    ) -> ConfigResult<()> {
        if self.options.force || self.options.merge {
            return Ok(());
        }

        for (name, value) in entries {
            match existing_entry(root, scope, name) {
                Some(existing) if existing != value => {
                    let confirmed = self
                        .prompt
                        .as_ref()
                        .map(|p| p.confirm_overwrite(name, path))
                        .unwrap_or(false);
                    if !confirmed {
                        return Err(ConfigError::ExistingEntryConflict {
                            name: name.clone(),
                            path: PathBuf::from(path),
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}
