//! Library orchestration
//!
//! One [`Library`] per open document owns the merged view of the remote
//! library and the locally persisted cited entries, and exposes the
//! `update` / `cite` / `save` / `snapshot` operations the editing surface
//! drives.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};
use zotcite_bibtex::{parse_all, parse_entry, serialize_entries, BibEntry};

use crate::error::{GatewayError, LibraryError};
use crate::gateway::{LibraryKind, RemoteInstance, RemoteLibraryGateway};
use crate::item::LibraryItem;
use crate::merge::{merge, KeyDrift};

/// Credentials for the root remote library.
#[derive(Debug, Clone)]
pub struct RemoteCredentials {
    pub user_id: String,
    pub api_key: String,
}

/// Result of an [`Library::update`] call.
#[derive(Debug)]
pub enum UpdateOutcome {
    Completed {
        item_count: usize,
        drifts: Vec<KeyDrift>,
        /// Malformed entries skipped while reading the local file.
        parse_errors: usize,
    },
    /// Another update was already in flight; this request was dropped.
    AlreadyRunning,
    /// No remote credentials are configured; nothing was done.
    NotConfigured,
}

struct LibraryState {
    items: Vec<LibraryItem>,
    bib_path: Option<PathBuf>,
    /// Citations inserted since the last successful save.
    uncommitted: bool,
}

/// Per-document library of bibliographic items.
///
/// `update` runs on at most one background task at a time (a second
/// request is dropped, not queued); `cite`, `save` and `snapshot`
/// serialize against a running update through the state lock, so `save`
/// always persists the items as of the moment it was called.
pub struct Library {
    gateway: Arc<dyn RemoteLibraryGateway>,
    credentials: Option<RemoteCredentials>,
    state: Mutex<LibraryState>,
    update_slot: Mutex<()>,
}

impl Library {
    pub fn new(
        gateway: Arc<dyn RemoteLibraryGateway>,
        credentials: Option<RemoteCredentials>,
        bib_path: Option<PathBuf>,
    ) -> Self {
        Self {
            gateway,
            credentials,
            state: Mutex::new(LibraryState {
                items: Vec::new(),
                bib_path,
                uncommitted: false,
            }),
            update_slot: Mutex::new(()),
        }
    }

    /// The sibling citation file for a document: same path, `.bib`
    /// extension.
    pub fn sibling_bib_path(document_path: &Path) -> PathBuf {
        document_path.with_extension("bib")
    }

    /// Whether a readable citation file exists at `path`.
    pub fn has_bib_file(path: &Path) -> bool {
        fs::File::open(path).is_ok()
    }

    pub fn bib_path(&self) -> Option<PathBuf> {
        self.state().bib_path.clone()
    }

    pub fn set_bib_path(&self, path: Option<PathBuf>) {
        self.state().bib_path = path;
    }

    /// Whether citations were inserted since the last successful save.
    pub fn has_uncommitted(&self) -> bool {
        self.state().uncommitted
    }

    /// Immutable copy of the current items for presentation. Safe to call
    /// while an update runs on another task.
    pub fn snapshot(&self) -> Vec<LibraryItem> {
        self.state().items.clone()
    }

    /// Refetch the remote library, re-read the local citation file, and
    /// replace the items with the merged result.
    ///
    /// A concurrent update drops this request (`AlreadyRunning`); missing
    /// credentials make it a reported no-op (`NotConfigured`). A local
    /// file that is absent or unreadable counts as empty. A failed remote
    /// fetch of the root library leaves the previous items untouched and
    /// propagates the error; a failed linked-group branch is skipped.
    pub fn update(&self) -> Result<UpdateOutcome, LibraryError> {
        let _slot = match self.update_slot.try_lock() {
            Ok(slot) => slot,
            Err(_) => return Ok(UpdateOutcome::AlreadyRunning),
        };
        let credentials = match &self.credentials {
            Some(credentials) => credentials.clone(),
            None => {
                debug!("update skipped: no remote credentials configured");
                return Ok(UpdateOutcome::NotConfigured);
            }
        };

        let bib_path = self.state().bib_path.clone();
        let (local_entries, parse_errors) = match &bib_path {
            Some(path) => read_local_entries(path),
            None => (Vec::new(), 0),
        };

        // All network traffic — the item traversal and the drift-key
        // fetches — happens before the state lock is taken; readers keep
        // seeing the previous snapshot until the swap below. The update
        // slot already rules out a competing update.
        let remote_items = self.collect_remote_items(&credentials)?;
        let drift_keys = self.collect_drift_keys(&remote_items, &local_entries);

        let mut state = self.state();
        let mut current_key = |item: &LibraryItem| {
            item.remote_id
                .as_deref()
                .and_then(|id| drift_keys.get(id).cloned())
        };
        let outcome = merge(remote_items, local_entries, &mut current_key);
        debug!(items = outcome.items.len(), drifts = outcome.drifts.len(), "library updated");
        state.items = outcome.items;

        Ok(UpdateOutcome::Completed {
            item_count: state.items.len(),
            drifts: outcome.drifts,
            parse_errors,
        })
    }

    /// Mark `item` as cited and return its citation key.
    ///
    /// Idempotent: an already cited item returns its stored key without a
    /// gateway call. An uncited item must carry a remote identity; the
    /// fetched entry is stamped with the reserved back-link fields before
    /// it is stored, so the next save persists the link.
    pub fn cite(&self, item: &LibraryItem) -> Result<String, LibraryError> {
        let mut state = self.state();
        let index = state
            .items
            .iter()
            .position(|candidate| candidate.same_identity(item))
            .ok_or(LibraryError::UnknownItem)?;

        if let Some(entry) = &state.items[index].cited_entry {
            return Ok(entry.citation_key.clone());
        }

        let (remote_id, instance) = match (
            &state.items[index].remote_id,
            &state.items[index].remote_instance,
        ) {
            (Some(id), Some(instance)) => (id.clone(), instance.clone()),
            _ => return Err(LibraryError::NoRemoteIdentity),
        };

        let text = self
            .gateway
            .fetch_bibtex_text(&instance.library_id, instance.kind, &remote_id)?;
        let mut entry =
            parse_entry(&text).map_err(|e| LibraryError::BadBibTex(e.to_string()))?;
        entry.link_remote(&remote_id, &instance.library_id, instance.kind.as_str());

        let key = entry.citation_key.clone();
        state.items[index].cited_entry = Some(entry);
        state.uncommitted = true;
        Ok(key)
    }

    /// Persist every cited entry to the configured citation file.
    ///
    /// Returns `Ok(false)` when no path is configured. The file is
    /// written to a sibling temp file and atomically renamed over the
    /// target.
    pub fn save(&self) -> Result<bool, LibraryError> {
        let mut state = self.state();
        let path = match state.bib_path.clone() {
            Some(path) => path,
            None => return Ok(false),
        };

        let cited: Vec<&BibEntry> = state
            .items
            .iter()
            .filter_map(|item| item.cited_entry.as_ref())
            .collect();
        let text = serialize_entries(cited);

        write_atomically(&path, &text).map_err(|source| LibraryError::Io { path, source })?;
        state.uncommitted = false;
        Ok(true)
    }

    /// Citation keys the remote side currently produces for the persisted
    /// cited entries that are still known remotely, keyed by remote id.
    /// Fetched eagerly so the merge under the state lock stays free of
    /// network I/O. Soft: any failed fetch skips that item's drift check.
    fn collect_drift_keys(
        &self,
        remote_items: &[LibraryItem],
        local_entries: &[BibEntry],
    ) -> HashMap<String, String> {
        let mut keys = HashMap::new();
        for entry in local_entries {
            let doc_id = match entry.remote_doc_id() {
                Some(id) => id,
                None => continue,
            };
            let lib_id = match entry.remote_lib_id() {
                Some(id) => id,
                None => continue,
            };
            let kind = match entry.remote_lib_type().and_then(LibraryKind::parse) {
                Some(kind) => kind,
                None => continue,
            };
            let known_remotely = remote_items
                .iter()
                .any(|item| item.remote_id.as_deref() == Some(doc_id));
            if !known_remotely {
                continue;
            }
            if let Some(key) = self.remote_citation_key(lib_id, kind, doc_id) {
                keys.insert(doc_id.to_string(), key);
            }
        }
        keys
    }

    fn remote_citation_key(
        &self,
        library_id: &str,
        kind: LibraryKind,
        item_id: &str,
    ) -> Option<String> {
        let text = match self.gateway.fetch_bibtex_text(library_id, kind, item_id) {
            Ok(text) => text,
            Err(error) => {
                warn!(%item_id, %error, "could not refresh citation key");
                return None;
            }
        };
        parse_entry(&text).ok().map(|entry| entry.citation_key)
    }

    /// Root user library plus every transitively linked group, visited
    /// once each so reciprocal group links cannot recurse forever.
    fn collect_remote_items(
        &self,
        credentials: &RemoteCredentials,
    ) -> Result<Vec<LibraryItem>, GatewayError> {
        let root = RemoteInstance::user(credentials.user_id.clone());
        let mut visited: HashSet<RemoteInstance> = HashSet::new();
        let mut pending = vec![root.clone()];
        let mut items = Vec::new();

        while let Some(instance) = pending.pop() {
            if !visited.insert(instance.clone()) {
                continue;
            }
            let fetched = self.fetch_instance(&instance, &mut pending);
            match fetched {
                Ok(mut instance_items) => items.append(&mut instance_items),
                Err(error) if instance == root => return Err(error),
                Err(error) => {
                    warn!(
                        library_id = %instance.library_id,
                        kind = instance.kind.as_str(),
                        %error,
                        "skipping unreachable group library"
                    );
                }
            }
        }
        Ok(items)
    }

    fn fetch_instance(
        &self,
        instance: &RemoteInstance,
        pending: &mut Vec<RemoteInstance>,
    ) -> Result<Vec<LibraryItem>, GatewayError> {
        let raw_items = self
            .gateway
            .list_top_level_items(&instance.library_id, instance.kind)?;
        let items = raw_items
            .into_iter()
            .map(|raw| LibraryItem::from_remote(instance, raw))
            .collect();
        for group in self
            .gateway
            .list_linked_groups(&instance.library_id, instance.kind)?
        {
            pending.push(RemoteInstance::group(group.group_id));
        }
        Ok(items)
    }

    fn state(&self) -> MutexGuard<'_, LibraryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Read the persisted cited entries. Absent or unreadable files count as
/// empty; malformed entries are skipped and counted.
fn read_local_entries(path: &Path) -> (Vec<BibEntry>, usize) {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) => {
            debug!(path = %path.display(), %error, "no readable citation file");
            return (Vec::new(), 0);
        }
    };
    let outcome = parse_all(&text);
    for error in &outcome.errors {
        warn!(path = %path.display(), %error, "skipping malformed entry");
    }
    (outcome.entries, outcome.errors.len())
}

fn write_atomically(path: &Path, text: &str) -> io::Result<()> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);
    fs::write(&temp, text)?;
    fs::rename(&temp, path)
}
