//! BibTeX entry data structures

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Reserved field linking an entry back to its remote document id.
pub const REMOTE_DOC_ID_FIELD: &str = "zoterodocid";
/// Reserved field recording the remote library id the entry came from.
pub const REMOTE_LIB_ID_FIELD: &str = "zoterolibid";
/// Reserved field recording the remote library kind ("user" or "group").
pub const REMOTE_LIB_TYPE_FIELD: &str = "zoterolibtype";

/// A parsed BibTeX entry.
///
/// Field values keep their original delimiter wrapping (braces, quotes,
/// or bare text) so that serializing an entry reproduces what was read.
/// Fields are stored in a `BTreeMap`, which makes serialization order
/// deterministic; by contract the field order carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibEntry {
    pub entry_type: String,
    pub citation_key: String,
    pub fields: BTreeMap<String, String>,
}

impl BibEntry {
    /// Create a new entry with no fields.
    pub fn new(entry_type: impl Into<String>, citation_key: impl Into<String>) -> Self {
        Self {
            entry_type: entry_type.into(),
            citation_key: citation_key.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Set a field to a plain-text value, wrapping it in braces.
    pub fn set_field(&mut self, name: impl Into<String>, value: &str) {
        self.fields.insert(name.into(), format!("{{{}}}", value));
    }

    /// Raw field value with its original wrapping, matched case-insensitively.
    pub fn raw_field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Field value with one level of delimiter wrapping removed.
    ///
    /// Returns `None` when the field is absent; callers apply their own
    /// defaults.
    pub fn field_text(&self, name: &str) -> Option<&str> {
        self.raw_field(name).map(unwrap_value)
    }

    /// The title field.
    pub fn title(&self) -> Option<&str> {
        self.field_text("title")
    }

    /// The author field.
    pub fn author(&self) -> Option<&str> {
        self.field_text("author")
    }

    /// The year field.
    pub fn year(&self) -> Option<&str> {
        self.field_text("year")
    }

    /// The abstract field.
    pub fn abstract_text(&self) -> Option<&str> {
        self.field_text("abstract")
    }

    /// Remote document id from the reserved back-link fields, if any.
    pub fn remote_doc_id(&self) -> Option<&str> {
        self.field_text(REMOTE_DOC_ID_FIELD)
    }

    /// Remote library id from the reserved back-link fields, if any.
    pub fn remote_lib_id(&self) -> Option<&str> {
        self.field_text(REMOTE_LIB_ID_FIELD)
    }

    /// Remote library kind from the reserved back-link fields, if any.
    pub fn remote_lib_type(&self) -> Option<&str> {
        self.field_text(REMOTE_LIB_TYPE_FIELD)
    }

    /// True when none of the reserved back-link fields are present,
    /// i.e. the entry was authored locally with no remote counterpart.
    pub fn is_local_only(&self) -> bool {
        self.remote_doc_id().is_none()
            && self.remote_lib_id().is_none()
            && self.remote_lib_type().is_none()
    }

    /// Stamp the reserved back-link fields pointing at a remote item.
    pub fn link_remote(&mut self, doc_id: &str, lib_id: &str, lib_type: &str) {
        self.set_field(REMOTE_DOC_ID_FIELD, doc_id);
        self.set_field(REMOTE_LIB_ID_FIELD, lib_id);
        self.set_field(REMOTE_LIB_TYPE_FIELD, lib_type);
    }
}

/// Strip one level of brace or quote wrapping from a field value.
fn unwrap_value(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.len() >= 2 {
        let stripped = trimmed
            .strip_prefix('{')
            .and_then(|v| v.strip_suffix('}'))
            .or_else(|| trimmed.strip_prefix('"').and_then(|v| v.strip_suffix('"')));
        if let Some(inner) = stripped {
            return inner;
        }
    }
    trimmed
}
