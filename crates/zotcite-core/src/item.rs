//! Reconciled library items
//!
//! A [`LibraryItem`] is one bibliographic record as presented to the user:
//! either fetched from the remote library, read back from the local
//! citation file, or both once reconciled.

use zotcite_bibtex::BibEntry;

use crate::gateway::{Creator, LibraryKind, RawItem, RemoteInstance};

const NO_AUTHORS: &str = "No Author(s)";
const NO_TITLE: &str = "No Title";
const NO_DATE: &str = "????";

/// One reconciled bibliographic record.
#[derive(Debug, Clone)]
pub struct LibraryItem {
    /// Remote document id; `None` for an entry known only from the local
    /// citation file.
    pub remote_id: Option<String>,
    /// Which remote library the item came from.
    pub remote_instance: Option<RemoteInstance>,
    pub authors: String,
    pub title: String,
    pub year: String,
    pub abstract_text: String,
    /// Present once the item has been inserted as a citation.
    pub cited_entry: Option<BibEntry>,
    /// The citation key the remote side would currently produce, when it
    /// diverges from the persisted one. Never auto-applied.
    pub drifted_key: Option<String>,
}

impl LibraryItem {
    /// Build an item from a raw remote record.
    pub fn from_remote(instance: &RemoteInstance, raw: RawItem) -> Self {
        Self {
            remote_id: Some(raw.key),
            remote_instance: Some(instance.clone()),
            authors: decode_authors(&raw.creators),
            title: raw.title.unwrap_or_else(|| NO_TITLE.to_string()),
            year: raw.date.unwrap_or_else(|| NO_DATE.to_string()),
            abstract_text: raw.abstract_note.unwrap_or_default(),
            cited_entry: None,
            drifted_key: None,
        }
    }

    /// Build an item from an entry persisted in the local citation file.
    ///
    /// The reserved back-link fields, when present, restore the remote
    /// identity; without them the item is locally authored.
    pub fn from_cited_entry(entry: BibEntry) -> Self {
        let remote_id = entry.remote_doc_id().map(str::to_string);
        let remote_instance = match (entry.remote_lib_id(), entry.remote_lib_type()) {
            (Some(lib_id), Some(lib_type)) => LibraryKind::parse(lib_type).map(|kind| {
                RemoteInstance {
                    library_id: lib_id.to_string(),
                    kind,
                }
            }),
            _ => None,
        };
        Self {
            remote_id,
            remote_instance,
            authors: entry.author().unwrap_or(NO_AUTHORS).to_string(),
            title: entry.title().unwrap_or(NO_TITLE).to_string(),
            year: entry.year().unwrap_or(NO_DATE).to_string(),
            abstract_text: entry.abstract_text().unwrap_or_default().to_string(),
            cited_entry: Some(entry),
            drifted_key: None,
        }
    }

    /// Whether this item has been inserted as a citation.
    pub fn cited(&self) -> bool {
        self.cited_entry.is_some()
    }

    /// The persisted citation key, once cited.
    pub fn citation_key(&self) -> Option<&str> {
        self.cited_entry.as_ref().map(|e| e.citation_key.as_str())
    }

    /// Identity contract: two items match iff both carry a remote id and
    /// those ids are equal; otherwise their citation keys are compared.
    /// Two id-less, citation-less items never match (not even an item
    /// against itself), so this is a named method rather than `PartialEq`.
    pub fn same_identity(&self, other: &LibraryItem) -> bool {
        if let (Some(a), Some(b)) = (&self.remote_id, &other.remote_id) {
            return a == b;
        }
        match (self.citation_key(), other.citation_key()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Rows for a quick-pick selection UI: one searchable headline,
    /// up to five wrapped abstract rows, and a provenance marker for
    /// file-only entries.
    pub fn menu_rows(&self) -> Vec<String> {
        let mut rows = Vec::new();
        let headline = format!("{} ({}): {}", self.authors, self.year, self.title);
        if headline.len() > 100 {
            rows.push(format!("{}...", truncate(&headline, 97)));
        } else {
            rows.push(headline);
        }
        rows.extend(wrap_abstract(&self.abstract_text, 5));
        if self.remote_id.is_none() {
            rows.push("Entry from local .bib-file".to_string());
        }
        rows
    }
}

/// Display string for an ordered creator list: `"Last, F; Last, F"`,
/// first initial only.
fn decode_authors(creators: &[Creator]) -> String {
    if creators.is_empty() {
        return NO_AUTHORS.to_string();
    }
    creators
        .iter()
        .map(|c| {
            let initial = c
                .first_name
                .split_whitespace()
                .next()
                .and_then(|w| w.chars().next());
            match initial {
                Some(i) => format!("{}, {}", c.last_name, i),
                None => c.last_name.clone(),
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn wrap_abstract(text: &str, max_rows: usize) -> Vec<String> {
    let mut rows = Vec::new();
    if text.is_empty() {
        return rows;
    }
    let mut row = String::new();
    for word in text.split_whitespace() {
        if !row.is_empty() && row.len() + word.len() + 1 > 125 {
            if rows.len() + 1 >= max_rows {
                rows.push(format!("{}...", truncate(&row, 122)));
                return rows;
            }
            rows.push(std::mem::take(&mut row));
        }
        if !row.is_empty() {
            row.push(' ');
        }
        row.push_str(word);
    }
    if !row.is_empty() {
        rows.push(row);
    }
    rows
}

fn truncate(s: &str, max: usize) -> &str {
    let mut end = max.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
