//! Per-document library registry
//!
//! An explicit registry object owned by the editing-surface adapter,
//! keyed by a stable document identifier. Never global: command handlers
//! receive the registry by reference and look libraries up per document.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::library::Library;

/// Maps document identifiers to their [`Library`] handles.
#[derive(Default)]
pub struct LibraryRegistry {
    libraries: Mutex<HashMap<String, Arc<Library>>>,
}

impl LibraryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The library for `document_id`, creating it with `init` on first
    /// access.
    pub fn open_with(
        &self,
        document_id: &str,
        init: impl FnOnce() -> Library,
    ) -> Arc<Library> {
        let mut libraries = self.lock();
        Arc::clone(
            libraries
                .entry(document_id.to_string())
                .or_insert_with(|| Arc::new(init())),
        )
    }

    pub fn get(&self, document_id: &str) -> Option<Arc<Library>> {
        self.lock().get(document_id).cloned()
    }

    pub fn contains(&self, document_id: &str) -> bool {
        self.lock().contains_key(document_id)
    }

    /// Drop the library for a closed document.
    ///
    /// With `only_if_clean`, removal is deferred while the library still
    /// holds cited entries pending persistence; returns whether the entry
    /// was removed.
    pub fn release(&self, document_id: &str, only_if_clean: bool) -> bool {
        let mut libraries = self.lock();
        if only_if_clean {
            if let Some(library) = libraries.get(document_id) {
                if library.has_uncommitted() {
                    return false;
                }
            }
        }
        libraries.remove(document_id).is_some()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Library>>> {
        self.libraries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
