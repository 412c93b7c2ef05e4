//! BibTeX parsing and formatting for the zotcite citation core
//!
//! The codec is deliberately structural: it captures entry spans by
//! brace-depth scanning, keeps field values with their original delimiter
//! wrapping, and re-emits them verbatim, so a parse/serialize cycle is
//! lossless. It performs no semantic validation of field contents.
//!
//! One malformed entry never aborts a file: the parser reports it and
//! resumes at the next entry boundary.

mod entry;
mod formatter;
mod parser;

pub use entry::{
    BibEntry, REMOTE_DOC_ID_FIELD, REMOTE_LIB_ID_FIELD, REMOTE_LIB_TYPE_FIELD,
};
pub use formatter::{serialize_entries, serialize_entry};
pub use parser::{parse_all, parse_entry, ParseError, ParseOutcome};
