//! zotcite-core: citation support backed by a remote reference library
//!
//! This crate keeps three views of "the known bibliographic entries"
//! consistent for one open document:
//! - the remote reference-manager library, reached through the
//!   [`RemoteLibraryGateway`] capability interface,
//! - a locally persisted BibTeX file recording the entries the document
//!   already cites (see the `zotcite-bibtex` codec),
//! - the in-memory merged view presented to the user for insertion.
//!
//! On top of the merged view it computes, from the text preceding the
//! cursor, the exact citation text to emit — either a LaTeX-style command
//! or a Pandoc-style bracketed list.
//!
//! The editor surface (buffers, selection UI, settings) and the network
//! transport are external collaborators; this crate only defines their
//! boundary.

pub mod error;
pub mod gateway;
pub mod insert;
pub mod item;
pub mod library;
pub mod merge;
pub mod registry;

pub use error::{GatewayError, LibraryError};
pub use zotcite_bibtex::BibEntry;
pub use gateway::{Creator, GroupRef, LibraryKind, RawItem, RemoteInstance, RemoteLibraryGateway};
pub use insert::{resolve_insertion, Dialect, Insertion, KEY_PLACEHOLDER};
pub use item::LibraryItem;
pub use library::{Library, RemoteCredentials, UpdateOutcome};
pub use merge::{merge, KeyDrift, MergeOutcome};
pub use registry::LibraryRegistry;
