//! Structural merge primitive.
//!
//! One merge routine serves both reconciliation targets: the server
//! registry document (entries nested under a `servers` object) and the
//! editor settings document (flat dotted top-level keys). The merge is
//! always structural; there is no string-level fallback.

use serde_json::{Map, Value};

/// Where the harness-owned entries live inside the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeScope<'a> {
    /// Entries nested under a named top-level object, e.g. `servers`.
    Nested(&'a str),
    /// Entries written directly at the top level (dotted settings keys).
    Flat,
}

/// Look up the current value for `name` within the scope, if any.
pub fn existing_entry<'v>(
    root: &'v Map<String, Value>,
    scope: MergeScope<'_>,
    name: &str,
) -> Option<&'v Value> {
    match scope {
        MergeScope::Nested(container) => root.get(container)?.as_object()?.get(name),
        MergeScope::Flat => root.get(name),
    }
}

/// Insert or overwrite `entries` within the scope.
///
/// Every sibling key — other top-level keys, and other entries inside
/// the scope container — is left untouched. Returns whether the
/// document observably changed.
pub fn merge_entries(
    root: &mut Map<String, Value>,
    scope: MergeScope<'_>,
    entries: &Map<String, Value>,
) -> bool {
    let target = match scope {
        MergeScope::Nested(container) => {
            let slot = root
                .entry(container.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                // A scalar where the container object belongs cannot hold
                // entries; the malformed value is replaced.
                *slot = Value::Object(Map::new());
            }
            match slot.as_object_mut() {
                Some(obj) => obj,
                None => unreachable!("container was just coerced to an object"),
            }
        }
        MergeScope::Flat => root,
    };

    let mut changed = false;
    for (key, value) in entries {
        if target.get(key) != Some(value) {
            target.insert(key.clone(), value.clone());
            changed = true;
        }
    }
    changed
}
