//! Round-trip property tests
//!
//! For any sequence of well-formed entries, serializing and re-parsing
//! reproduces the same (entry_type, citation_key, fields) tuples.

use proptest::collection::{btree_map, vec};
use proptest::prelude::*;

use zotcite_bibtex::{parse_all, serialize_entries, BibEntry};

fn entry_type() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("article".to_string()),
        Just("book".to_string()),
        Just("inproceedings".to_string()),
        Just("misc".to_string()),
    ]
}

fn citation_key() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_:.-]{0,11}"
}

fn field_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,9}"
}

// Braced values may contain commas, spaces, and nested braces; bare
// values are numeric. Both shapes survive the permissive field scanner.
fn field_value() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ,.:;()-]{0,24}".prop_map(|s| format!("{{{}}}", s)),
        "[a-zA-Z0-9 .-]{0,12}".prop_map(|s| format!("{{a {{n{}d}} b}}", s)),
        "[0-9]{1,4}",
    ]
}

fn arb_entry() -> impl Strategy<Value = BibEntry> {
    (
        entry_type(),
        citation_key(),
        btree_map(field_name(), field_value(), 0..6),
    )
        .prop_map(|(entry_type, citation_key, fields)| BibEntry {
            entry_type,
            citation_key,
            fields,
        })
}

proptest! {
    #[test]
    fn test_round_trip_preserves_entries(entries in vec(arb_entry(), 0..5)) {
        let text = serialize_entries(&entries);
        let outcome = parse_all(&text);
        prop_assert!(outcome.errors.is_empty(), "errors: {:?}", outcome.errors);
        prop_assert_eq!(outcome.entries, entries);
    }
}
