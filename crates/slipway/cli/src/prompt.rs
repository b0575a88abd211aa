//! Interactive conflict confirmation.

use std::path::Path;

use slipway_reconcile::ConflictPrompt;

/// Terminal-backed confirmation for overwriting a conflicting entry.
pub struct TerminalPrompt;

impl ConflictPrompt for TerminalPrompt {
    fn confirm_overwrite(&self, name: &str, path: &Path) -> bool {
        dialoguer::Confirm::new()
            .with_prompt(format!(
                "Entry '{}' in {} already exists with a different value. Overwrite?",
                name,
                path.display()
            ))
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}
