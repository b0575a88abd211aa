//! Editor configuration reconciliation for the Slipway harness.
//!
//! Reconciliation merges the harness's declarative entries into
//! pre-existing, user-owned JSON documents without disturbing unrelated
//! content. Every destructive write is preceded by a timestamped backup
//! and lands via temp-then-rename, so the original file is intact on
//! any failure.
//!
//! Two structurally different targets share one merge primitive: the
//! server registry (entries nested under `servers`) and the editor
//! settings document (flat dotted keys).

mod backup;
mod document;
mod error;
mod merge;
mod paths;
mod reconciler;

pub use backup::BackupManager;
pub use document::{ConfigDocument, LoadedDocument};
pub use error::{ConfigError, ConfigResult};
pub use merge::{existing_entry, merge_entries, MergeScope};
pub use paths::{PathResolver, Platform};
pub use reconciler::{ConfigReconciler, ConflictPrompt, ReconcileOptions, ReconcileResult};
