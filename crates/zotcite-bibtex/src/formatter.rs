//! BibTeX serialization
//!
//! Re-emits entries deterministically as `@type{key,\n\tfield = value,\n...}\n`.
//! Field values are written exactly as stored, so a parse/serialize cycle
//! preserves the original delimiter wrapping.

use crate::entry::BibEntry;

/// Serialize a single entry, including its trailing newline.
pub fn serialize_entry(entry: &BibEntry) -> String {
    let mut out = String::new();
    out.push('@');
    out.push_str(&entry.entry_type);
    out.push('{');
    out.push_str(&entry.citation_key);
    out.push_str(",\n");
    for (name, value) in &entry.fields {
        out.push('\t');
        out.push_str(name);
        out.push_str(" = ");
        out.push_str(value);
        out.push_str(",\n");
    }
    out.push_str("}\n");
    out
}

/// Serialize a sequence of entries into one text blob.
pub fn serialize_entries<'a>(entries: impl IntoIterator<Item = &'a BibEntry>) -> String {
    entries.into_iter().map(serialize_entry).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_all;

    #[test]
    fn test_serialize_single_entry() {
        let mut entry = BibEntry::new("article", "Smith2024");
        entry.set_field("author", "John Smith");
        entry.set_field("title", "A Great Paper");

        let text = serialize_entry(&entry);
        assert!(text.starts_with("@article{Smith2024,\n"));
        assert!(text.contains("\tauthor = {John Smith},\n"));
        assert!(text.contains("\ttitle = {A Great Paper},\n"));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn test_serialize_keeps_raw_wrapping() {
        let outcome = parse_all("@misc{k,\n\tyear = 1905,\n\tnote = \"quoted\",\n}");
        let text = serialize_entry(&outcome.entries[0]);
        assert!(text.contains("\tyear = 1905,\n"));
        assert!(text.contains("\tnote = \"quoted\",\n"));
    }

    #[test]
    fn test_round_trip_two_entries() {
        let input = "@article{a1,\n\ttitle = {First {P}aper},\n\tyear = {1905},\n}\n@book{b2,\n\ttitle = {Second},\n}\n";
        let first = parse_all(input);
        assert!(first.errors.is_empty());
        let text = serialize_entries(&first.entries);
        let second = parse_all(&text);
        assert!(second.errors.is_empty());
        assert_eq!(first.entries, second.entries);
    }
}
