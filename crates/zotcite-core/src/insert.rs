//! Citation context resolver
//!
//! Given the text preceding the cursor, decides whether to start a new
//! citation or extend one already under construction. Matching is
//! anchored at the end of the preceding text and never looks past the
//! start of the current line; the editing surface supplies the text and
//! applies the returned replacement.

use lazy_static::lazy_static;
use regex::Regex;

/// Placeholder substituted with the citation key by [`Insertion::fill`].
pub const KEY_PLACEHOLDER: &str = "%s";

const DEFAULT_COMMAND: &str = "cite";

/// Supported in-document citation syntaxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// LaTeX-style `\cite{...}` commands.
    Command,
    /// Pandoc-style `[...; @key]` bracketed lists.
    BracketedList,
}

/// The text to insert and how much of the preceding text it replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    /// Contains exactly one [`KEY_PLACEHOLDER`].
    pub template: String,
    /// Length in bytes of the suffix of the preceding text to replace;
    /// zero means plain insertion at the cursor.
    pub replace_len: usize,
}

impl Insertion {
    /// Substitute the citation key into the template.
    pub fn fill(&self, citation_key: &str) -> String {
        self.template.replacen(KEY_PLACEHOLDER, citation_key, 1)
    }
}

lazy_static! {
    // `\<command>? <[options]>{0,2} {<existing-keys> }?` anchored at the
    // end of the line. Everything is optional, so the leftmost match that
    // reaches end-of-text is the longest such suffix; an empty match means
    // no citation is under construction. Option brackets may contain
    // spaces (`[p. 5]`).
    static ref COMMAND_SUFFIX: Regex =
        Regex::new(r"(?:\\([A-Za-z]+))?((?:\[[^\[\]]*\]){0,2})(?:\{([^{}]*)\}?)?$")
            .expect("command suffix pattern");

    // `[<inner><]?>` anchored at the end of the line; the closing bracket
    // may or may not have been typed yet.
    static ref BRACKET_SUFFIX: Regex =
        Regex::new(r"\[([^\[\]]*)(\]?)$").expect("bracket suffix pattern");
}

/// Compute the citation text to emit at the cursor.
///
/// `preceding_text` is the text before the cursor; only its current line
/// is inspected. `command_override` forces the command name in the
/// command dialect (resolution order: override, command captured from the
/// text, the literal `cite`).
pub fn resolve_insertion(
    preceding_text: &str,
    dialect: Dialect,
    command_override: Option<&str>,
) -> Insertion {
    let line = current_line(preceding_text);
    match dialect {
        Dialect::Command => resolve_command(line, command_override),
        Dialect::BracketedList => resolve_bracketed(line),
    }
}

fn current_line(text: &str) -> &str {
    text.rsplit('\n').next().unwrap_or(text)
}

fn resolve_command(line: &str, command_override: Option<&str>) -> Insertion {
    let caps = match COMMAND_SUFFIX.captures(line) {
        Some(caps) => caps,
        None => return fresh_command(command_override),
    };
    let matched = caps.get(0).map_or("", |m| m.as_str());
    if matched.is_empty() {
        return fresh_command(command_override);
    }

    let command = command_override
        .or_else(|| caps.get(1).map(|m| m.as_str()).filter(|s| !s.is_empty()))
        .unwrap_or(DEFAULT_COMMAND);
    let options = caps.get(2).map_or("", |m| m.as_str());
    let keys = caps.get(3).map_or("", |m| m.as_str());

    let template = if keys.is_empty() {
        format!("\\{}{}{{{}}}", command, options, KEY_PLACEHOLDER)
    } else {
        // Append to the open key list instead of starting a second
        // citation command.
        format!("\\{}{}{{{},{}}}", command, options, keys, KEY_PLACEHOLDER)
    };
    Insertion {
        template,
        replace_len: matched.len(),
    }
}

fn fresh_command(command_override: Option<&str>) -> Insertion {
    Insertion {
        template: format!(
            "\\{}{{{}}}",
            command_override.unwrap_or(DEFAULT_COMMAND),
            KEY_PLACEHOLDER
        ),
        replace_len: 0,
    }
}

fn resolve_bracketed(line: &str) -> Insertion {
    let caps = match BRACKET_SUFFIX.captures(line) {
        Some(caps) => caps,
        None => {
            return Insertion {
                template: format!("@{}", KEY_PLACEHOLDER),
                replace_len: 0,
            }
        }
    };
    let matched = caps.get(0).map_or("", |m| m.as_str());
    let inner = caps.get(1).map_or("", |m| m.as_str());
    let closing = caps.get(2).map_or("", |m| m.as_str());

    let last_segment = inner.rsplit(';').next().unwrap_or("");
    let template = if last_segment.contains('@') {
        // The last segment already cites something. Provisional behavior:
        // start a new semicolon-separated entry after it.
        format!("[{}; @{}{}", inner, KEY_PLACEHOLDER, closing)
    } else {
        // Append the key to the segment, keeping any typed locator prefix
        // and the closing bracket when one was already there.
        format!("[{}@{}{}", inner, KEY_PLACEHOLDER, closing)
    };
    Insertion {
        template,
        replace_len: matched.len(),
    }
}
