//! Remote reference-manager gateway interface
//!
//! The core never talks to the network itself; it consumes this trait.
//! Concrete implementations own transport, auth, and pagination, and may
//! cache one client per remote instance behind the trait.

use serde::Deserialize;

use crate::error::GatewayError;

/// Whether a remote library is scoped to a user or to a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryKind {
    User,
    Group,
}

impl LibraryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
        }
    }

    /// Parse the on-disk representation stored in the reserved
    /// `zoterolibtype` field.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "group" => Some(Self::Group),
            _ => None,
        }
    }
}

/// Identifies one remote library (user or group scoped).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteInstance {
    pub library_id: String,
    pub kind: LibraryKind,
}

impl RemoteInstance {
    pub fn user(library_id: impl Into<String>) -> Self {
        Self {
            library_id: library_id.into(),
            kind: LibraryKind::User,
        }
    }

    pub fn group(library_id: impl Into<String>) -> Self {
        Self {
            library_id: library_id.into(),
            kind: LibraryKind::Group,
        }
    }
}

/// One creator of a remote item, as the remote API reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct Creator {
    #[serde(rename = "lastName", default)]
    pub last_name: String,
    #[serde(rename = "firstName", default)]
    pub first_name: String,
}

/// One raw bibliographic record from the remote library.
#[derive(Debug, Clone, Deserialize)]
pub struct RawItem {
    pub key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub creators: Vec<Creator>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "abstractNote", default)]
    pub abstract_note: Option<String>,
}

/// A group library linked from another library.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupRef {
    #[serde(rename = "group_id")]
    pub group_id: String,
}

/// Capability interface to the remote reference manager.
pub trait RemoteLibraryGateway: Send + Sync {
    /// All top-level items of one library.
    fn list_top_level_items(
        &self,
        library_id: &str,
        kind: LibraryKind,
    ) -> Result<Vec<RawItem>, GatewayError>;

    /// Group libraries linked from one library.
    fn list_linked_groups(
        &self,
        library_id: &str,
        kind: LibraryKind,
    ) -> Result<Vec<GroupRef>, GatewayError>;

    /// BibTeX text for a single item.
    fn fetch_bibtex_text(
        &self,
        library_id: &str,
        kind: LibraryKind,
        item_id: &str,
    ) -> Result<String, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_item_decodes_remote_json() {
        let json = r#"{
            "key": "R1",
            "title": "On the Electrodynamics of Moving Bodies",
            "creators": [
                {"lastName": "Einstein", "firstName": "Albert"}
            ],
            "date": "1905",
            "abstractNote": "Maxwell's electrodynamics..."
        }"#;
        let item: RawItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.key, "R1");
        assert_eq!(item.creators.len(), 1);
        assert_eq!(item.creators[0].last_name, "Einstein");
        assert_eq!(item.abstract_note.as_deref(), Some("Maxwell's electrodynamics..."));
    }

    #[test]
    fn test_raw_item_tolerates_missing_fields() {
        let item: RawItem = serde_json::from_str(r#"{"key": "R2"}"#).unwrap();
        assert_eq!(item.key, "R2");
        assert!(item.title.is_none());
        assert!(item.creators.is_empty());
    }
}
