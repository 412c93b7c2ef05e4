//! BibTeX parser
//!
//! Entry discovery runs byte-by-byte with a brace-depth counter: an entry
//! begins at an unescaped `@` outside any entry and ends at the first
//! depth-zero `}`. Each captured span is then matched against the fixed
//! grammar `@<type>{<key>,<body>}`. A span that fails the grammar is
//! reported and skipped without aborting the rest of the file.

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    IResult,
};
use std::collections::BTreeMap;

use crate::entry::BibEntry;

/// One malformed entry, reported while the rest of the file keeps parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed BibTeX entry at line {line}: {message}")]
pub struct ParseError {
    pub line: u32,
    pub message: String,
}

/// Result of parsing a BibTeX text blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub entries: Vec<BibEntry>,
    pub errors: Vec<ParseError>,
}

/// Parse every entry in `input`.
///
/// Empty input yields an empty outcome. One malformed entry yields one
/// [`ParseError`] while scanning resumes: after the entry's closing brace
/// when its braces balanced, or at the next `@` when they never closed.
pub fn parse_all(input: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    let bytes = input.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] == b'@' && (pos == 0 || bytes[pos - 1] != b'\\') {
            match scan_entry_span(input, pos) {
                Some(end) => {
                    match parse_entry_span(&input[pos..end]) {
                        Ok(entry) => outcome.entries.push(entry),
                        Err(message) => outcome.errors.push(ParseError {
                            line: line_of(input, pos),
                            message,
                        }),
                    }
                    pos = end;
                }
                None => {
                    outcome.errors.push(ParseError {
                        line: line_of(input, pos),
                        message: "unterminated entry (braces never close)".to_string(),
                    });
                    // Resume at the next '@' after the failed start.
                    pos += 1;
                }
            }
        } else {
            pos += 1;
        }
    }

    outcome
}

/// Parse a single entry from `input`, which must contain at least one
/// well-formed entry.
pub fn parse_entry(input: &str) -> Result<BibEntry, ParseError> {
    let mut outcome = parse_all(input);
    if let Some(entry) = outcome.entries.into_iter().next() {
        return Ok(entry);
    }
    Err(outcome.errors.pop().unwrap_or(ParseError {
        line: 1,
        message: "no BibTeX entry found".to_string(),
    }))
}

/// Find the end (exclusive) of the entry span starting at `start`,
/// tracking brace depth; `None` when the braces never balance.
fn scan_entry_span(input: &str, start: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut depth: i32 = 0;
    let mut opened = false;
    let mut pos = start;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 1,
            b'{' => {
                depth += 1;
                opened = true;
            }
            b'}' => {
                depth -= 1;
                if opened && depth == 0 {
                    return Some(pos + 1);
                }
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
        pos += 1;
    }
    None
}

/// Match one captured span against `@<type>{<key>,<body>}`.
fn parse_entry_span(span: &str) -> Result<BibEntry, String> {
    let (rest, (entry_type, citation_key)) = entry_header(span)
        .map_err(|_| "entry does not match @<type>{<key>,...}".to_string())?;
    let body = rest
        .strip_suffix('}')
        .ok_or_else(|| "entry body missing closing brace".to_string())?;

    let mut entry = BibEntry::new(entry_type, citation_key);
    entry.fields = parse_fields(body)?;
    Ok(entry)
}

/// Parse `@<type>{<key>,` — type and key are non-whitespace, non-brace
/// tokens.
fn entry_header(input: &str) -> IResult<&str, (&str, &str)> {
    let (rest, _) = char('@')(input)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, entry_type) =
        take_while1(|c: char| !c.is_whitespace() && c != '{' && c != '}')(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char('{')(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, key) =
        take_while1(|c: char| !c.is_whitespace() && c != ',' && c != '{' && c != '}')(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char(',')(rest)?;
    Ok((rest, (entry_type, key)))
}

/// Split an entry body into `field = value` pairs. Values keep their
/// original delimiter wrapping.
fn parse_fields(body: &str) -> Result<BTreeMap<String, String>, String> {
    let mut fields = BTreeMap::new();
    let mut rest = body;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            return Ok(fields);
        }

        let eq = rest
            .find('=')
            .ok_or_else(|| format!("field without '=': {:?}", head(rest)))?;
        let name = rest[..eq].trim();
        if name.is_empty() || name.contains(|c: char| c.is_whitespace() || c == '{' || c == '}') {
            return Err(format!("invalid field name {:?}", name));
        }

        let (value, remaining) = scan_field_value(&rest[eq + 1..]);
        fields.insert(name.to_string(), value.trim().to_string());
        rest = remaining;
    }
}

/// Scan one field value up to the next depth-zero comma outside quotes.
fn scan_field_value(input: &str) -> (&str, &str) {
    let bytes = input.as_bytes();
    let mut depth: i32 = 0;
    let mut in_quotes = false;
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 1,
            b'{' if !in_quotes => depth += 1,
            b'}' if !in_quotes => depth -= 1,
            b'"' if depth == 0 => in_quotes = !in_quotes,
            b',' if depth == 0 && !in_quotes => {
                return (&input[..pos], &input[pos + 1..]);
            }
            _ => {}
        }
        pos += 1;
    }
    (input, "")
}

fn line_of(input: &str, offset: usize) -> u32 {
    input[..offset].bytes().filter(|b| *b == b'\n').count() as u32 + 1
}

fn head(s: &str) -> &str {
    let mut end = s.len().min(24);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_entry() {
        let input = "@article{Smith2024,\n\tauthor = {John Smith},\n\ttitle = {A Great Paper},\n\tyear = {2024},\n}";
        let outcome = parse_all(input);
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.entries.len(), 1);

        let entry = &outcome.entries[0];
        assert_eq!(entry.entry_type, "article");
        assert_eq!(entry.citation_key, "Smith2024");
        assert_eq!(entry.author(), Some("John Smith"));
        assert_eq!(entry.title(), Some("A Great Paper"));
        assert_eq!(entry.year(), Some("2024"));
    }

    #[test]
    fn test_values_keep_original_wrapping() {
        let input = "@article{k,\n\ttitle = {A {B}ook about {LaTeX}},\n\tyear = 2024,\n\tnote = \"quoted\",\n}";
        let outcome = parse_all(input);
        let entry = &outcome.entries[0];
        assert_eq!(
            entry.raw_field("title"),
            Some("{A {B}ook about {LaTeX}}")
        );
        assert_eq!(entry.raw_field("year"), Some("2024"));
        assert_eq!(entry.raw_field("note"), Some("\"quoted\""));
    }

    #[test]
    fn test_value_with_comma_inside_braces() {
        let input = "@article{k,\n\tauthor = {Smith, John and Doe, Jane},\n}";
        let outcome = parse_all(input);
        assert_eq!(
            outcome.entries[0].author(),
            Some("Smith, John and Doe, Jane")
        );
    }

    #[test]
    fn test_empty_input_is_empty_outcome() {
        let outcome = parse_all("");
        assert!(outcome.entries.is_empty());
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_malformed_entry_does_not_abort_file() {
        let input = "@{nokey,}\n@article{good,\n\ttitle = {T},\n}";
        let outcome = parse_all(input);
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.entries[0].citation_key, "good");
        assert_eq!(outcome.errors.len(), 1);
    }

    #[test]
    fn test_unterminated_entry_recovers_at_next_at() {
        let input = "@bad{\n@good{k,\n\ttitle = {T},\n}";
        let outcome = parse_all(input);
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.entries[0].citation_key, "k");
        assert_eq!(outcome.entries[0].title(), Some("T"));
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].line, 1);
    }

    #[test]
    fn test_escaped_at_does_not_start_entry() {
        let input = "prose with \\@ sign\n@misc{k,\n\thowpublished = {web},\n}";
        let outcome = parse_all(input);
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.entries[0].citation_key, "k");
    }

    #[test]
    fn test_parse_entry_returns_first() {
        let entry = parse_entry("@book{b1,\n\ttitle = {One},\n}").unwrap();
        assert_eq!(entry.citation_key, "b1");
        assert!(parse_entry("no entries here").is_err());
    }

    #[test]
    fn test_entry_without_key_comma_is_error() {
        let outcome = parse_all("@misc{keyonly}");
        assert!(outcome.entries.is_empty());
        assert_eq!(outcome.errors.len(), 1);
    }
}
