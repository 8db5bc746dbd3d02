//! Command splitting
//!
//! Decomposes the composite command string of a `.cmd` file into single
//! commands and `if ...; then ...; fi` blocks, honoring quoting and
//! brace/paren nesting when scanning for top-level separators.

use regex::Regex;

const SEPARATORS: [&str; 2] = [";", "&&"];

/// A single-level `if <condition>; then <body>; fi` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfBlock {
    pub condition: String,
    pub then_statement: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandPart {
    Single(String),
    If(IfBlock),
}

pub struct Splitter {
    /// Single-level if/then/fi. Nested blocks are not matched and are left
    /// to the consumer to report.
    if_block: Regex,
}

impl Splitter {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            if_block: Regex::new(r"^if(.*?);\s*then(.*?);\s*fi\b")?,
        })
    }

    /// Split a composite command string into its parts, in order.
    pub fn split(&self, commands: &str) -> Vec<CommandPart> {
        let mut parts = Vec::new();
        let mut remaining = unwrap_outer_parentheses(commands);
        while !remaining.is_empty() {
            remaining = remaining.trim();

            if let Some(matched) = self.if_block.captures(remaining) {
                parts.push(CommandPart::If(IfBlock {
                    condition: matched[1].trim().to_string(),
                    then_statement: matched[2].trim().to_string(),
                }));
                remaining = remaining[matched[0].len()..].trim_start_matches([';', ' ', '\n']);
                continue;
            }

            if let Some((position, length)) = find_first_top_level_separator(remaining) {
                parts.push(CommandPart::Single(remaining[..position].trim().to_string()));
                remaining = remaining[position + length..].trim();
                continue;
            }

            parts.push(CommandPart::Single(remaining.to_string()));
            break;
        }
        parts
    }
}

/// Strip one layer of balanced outer parentheses, repeatedly, as long as the
/// whole string is a single paren group.
fn unwrap_outer_parentheses(s: &str) -> &str {
    let s = s.trim();
    if !(s.starts_with('(') && s.ends_with(')')) {
        return s;
    }

    let mut count = 0i32;
    for (i, c) in s.char_indices() {
        if c == '(' {
            count += 1;
        } else if c == ')' {
            count -= 1;
            // closed before the end: the outer parens do not match each other
            if count == 0 && i != s.len() - 1 {
                return s;
            }
        }
    }

    unwrap_outer_parentheses(&s[1..s.len() - 1])
}

/// Byte position and length of the first `;` or `&&` that sits outside of
/// quotes and outside of `{}`/`()` nesting. Quotes disable brace tracking.
fn find_first_top_level_separator(commands: &str) -> Option<(usize, usize)> {
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut in_curly_braces = 0i32;
    let mut in_parens = 0i32;
    for (i, c) in commands.char_indices() {
        if c == '\'' && !in_double_quote {
            in_single_quote = !in_single_quote;
        } else if c == '"' && !in_single_quote {
            in_double_quote = !in_double_quote;
        }

        if in_single_quote || in_double_quote {
            continue;
        }

        if c == '{' {
            in_curly_braces += 1;
        }
        if c == '}' {
            in_curly_braces -= 1;
        }

        if c == '(' {
            in_parens += 1;
        }
        if c == ')' {
            in_parens -= 1;
        }

        if in_curly_braces > 0 || in_parens > 0 {
            continue;
        }

        for separator in SEPARATORS {
            if commands[i..].starts_with(separator) {
                return Some((i, separator.len()));
            }
        }
    }

    None
}
