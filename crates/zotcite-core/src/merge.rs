//! Entry identity & merge engine
//!
//! Reconciles the remote item list with the locally persisted cited
//! entries into one deduplicated collection. The remote library is the
//! source of truth for descriptive metadata; the local file is the source
//! of truth for which entries are cited and under which key.

use tracing::warn;
use zotcite_bibtex::BibEntry;

use crate::item::LibraryItem;

/// A cited entry whose persisted citation key no longer matches what the
/// remote side currently produces. Surfaced, never auto-resolved:
/// rewriting the key would require touching every citation occurrence in
/// the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDrift {
    pub remote_id: String,
    pub stored_key: String,
    pub remote_key: String,
}

/// Result of one merge pass.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub items: Vec<LibraryItem>,
    pub drifts: Vec<KeyDrift>,
}

/// Merge remote items with locally persisted cited entries.
///
/// `current_key` supplies, for a remote item that matched an already
/// cited local entry, the citation key the remote side would produce
/// today; `None` skips drift detection for that item.
///
/// Local cited entries seed the result; each remote item is then tested
/// against the accumulated items under the identity contract. On a match
/// the local `cited_entry` is retained while the display fields take the
/// remote item's fresher values. Unmatched remote items are appended and
/// unmatched local items survive untouched, so a cited item is never
/// silently dropped. O(n*m) linear scan; both sides stay in the low
/// thousands.
pub fn merge(
    remote_items: Vec<LibraryItem>,
    local_entries: Vec<BibEntry>,
    current_key: &mut dyn FnMut(&LibraryItem) -> Option<String>,
) -> MergeOutcome {
    let mut items: Vec<LibraryItem> = local_entries
        .into_iter()
        .map(LibraryItem::from_cited_entry)
        .collect();
    let mut drifts = Vec::new();

    for mut remote in remote_items {
        let matched = items.iter().position(|existing| existing.same_identity(&remote));
        match matched {
            Some(index) => {
                if items[index].cited() {
                    remote.cited_entry = items[index].cited_entry.take();
                    if let Some(drift) = detect_drift(&remote, current_key) {
                        warn!(
                            remote_id = %drift.remote_id,
                            stored = %drift.stored_key,
                            remote = %drift.remote_key,
                            "citation key drifted"
                        );
                        remote.drifted_key = Some(drift.remote_key.clone());
                        drifts.push(drift);
                    }
                }
                items[index] = remote;
            }
            None => items.push(remote),
        }
    }

    MergeOutcome { items, drifts }
}

fn detect_drift(
    item: &LibraryItem,
    current_key: &mut dyn FnMut(&LibraryItem) -> Option<String>,
) -> Option<KeyDrift> {
    let stored_key = item.citation_key()?.to_string();
    let remote_id = item.remote_id.clone()?;
    let remote_key = current_key(item)?;
    if remote_key == stored_key {
        return None;
    }
    Some(KeyDrift {
        remote_id,
        stored_key,
        remote_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{Creator, RawItem, RemoteInstance};

    fn remote_item(id: &str, title: &str) -> LibraryItem {
        LibraryItem::from_remote(
            &RemoteInstance::user("42"),
            RawItem {
                key: id.to_string(),
                title: Some(title.to_string()),
                creators: vec![Creator {
                    last_name: "Noether".to_string(),
                    first_name: "Emmy".to_string(),
                }],
                date: Some("1918".to_string()),
                abstract_note: None,
            },
        )
    }

    fn cited_entry(key: &str, remote_id: Option<&str>) -> BibEntry {
        let mut entry = BibEntry::new("article", key);
        entry.set_field("title", "Stale Title");
        entry.set_field("author", "Stale, A");
        if let Some(id) = remote_id {
            entry.link_remote(id, "42", "user");
        }
        entry
    }

    #[test]
    fn test_matched_item_keeps_entry_takes_remote_metadata() {
        let outcome = merge(
            vec![remote_item("R1", "Fresh Title")],
            vec![cited_entry("noether1918", Some("R1"))],
            &mut |_| None,
        );
        assert_eq!(outcome.items.len(), 1);
        let item = &outcome.items[0];
        assert_eq!(item.remote_id.as_deref(), Some("R1"));
        assert_eq!(item.title, "Fresh Title");
        assert_eq!(item.authors, "Noether, E");
        assert_eq!(item.citation_key(), Some("noether1918"));
        assert!(outcome.drifts.is_empty());
    }

    #[test]
    fn test_orphaned_local_entry_survives() {
        let outcome = merge(
            vec![remote_item("R2", "Other")],
            vec![cited_entry("gone2020", Some("R1"))],
            &mut |_| None,
        );
        assert_eq!(outcome.items.len(), 2);
        let orphan = outcome
            .items
            .iter()
            .find(|i| i.citation_key() == Some("gone2020"))
            .unwrap();
        assert_eq!(orphan.title, "Stale Title");
        assert!(orphan.cited());
    }

    #[test]
    fn test_local_only_entry_without_backlink_survives() {
        let outcome = merge(
            vec![remote_item("R1", "T")],
            vec![cited_entry("localnote", None)],
            &mut |_| None,
        );
        assert_eq!(outcome.items.len(), 2);
        let local = outcome
            .items
            .iter()
            .find(|i| i.citation_key() == Some("localnote"))
            .unwrap();
        assert!(local.remote_id.is_none());
    }

    #[test]
    fn test_key_drift_is_flagged_not_rewritten() {
        let outcome = merge(
            vec![remote_item("R1", "T")],
            vec![cited_entry("oldkey", Some("R1"))],
            &mut |_| Some("newkey".to_string()),
        );
        assert_eq!(
            outcome.drifts,
            vec![KeyDrift {
                remote_id: "R1".to_string(),
                stored_key: "oldkey".to_string(),
                remote_key: "newkey".to_string(),
            }]
        );
        // The stored key stays authoritative for the document.
        assert_eq!(outcome.items[0].citation_key(), Some("oldkey"));
        assert_eq!(outcome.items[0].drifted_key.as_deref(), Some("newkey"));
    }

    #[test]
    fn test_matching_key_is_not_drift() {
        let outcome = merge(
            vec![remote_item("R1", "T")],
            vec![cited_entry("samekey", Some("R1"))],
            &mut |_| Some("samekey".to_string()),
        );
        assert!(outcome.drifts.is_empty());
        assert!(outcome.items[0].drifted_key.is_none());
    }

    #[test]
    fn test_duplicate_remote_items_collapse() {
        let outcome = merge(
            vec![remote_item("R1", "A"), remote_item("R1", "B")],
            vec![],
            &mut |_| None,
        );
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.items[0].title, "B");
    }
}
