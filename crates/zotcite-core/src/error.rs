//! Error types for the citation core

use std::path::PathBuf;

/// A remote gateway request failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("remote item not found: {0}")]
    NotFound(String),
    #[error("rate limited by the remote library")]
    RateLimited,
    #[error("remote library rejected the credentials")]
    Unauthorized,
}

/// Failures surfaced by [`crate::Library`] operations.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("local citation file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The item handed in by the editing surface no longer matches any
    /// item in the library.
    #[error("item not present in the library")]
    UnknownItem,

    /// The item has neither a cited entry nor a remote identity to fetch
    /// one from.
    #[error("item is not linked to a remote library entry")]
    NoRemoteIdentity,

    /// The remote side returned text that does not parse as a BibTeX entry.
    #[error("remote bibliographic text unusable: {0}")]
    BadBibTex(String),
}
