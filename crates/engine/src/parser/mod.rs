//! Command-line parsing
//!
//! Turns one chat line into a [`ParsedCommand`]. Lines that do not start
//! with the command marker are passed through untouched so the caller can
//! treat them as ordinary chat.
//!
//! # Example
//!
//! ```
//! use tabletalk_engine::parser::{parse, ParseOptions};
//!
//! let parsed = parse(r#"/talk @Bob "hello there" --whisper"#, &ParseOptions::default());
//! let args = parsed.args.as_ref().unwrap();
//!
//! assert_eq!(parsed.command.as_deref(), Some("talk"));
//! assert_eq!(args.targets, vec!["Bob"]);
//! assert_eq!(args.plain_text, vec!["hello there"]);
//! assert_eq!(args.flag("whisper").map(|v| v.as_str()), Some("true"));
//! ```

mod args;
mod autocomplete;
mod syntax;
mod tokenize;

pub use args::{CommandArgs, FlagValue, Flags, FLAG_PREFIX, TARGET_MARKER};
pub use autocomplete::{generate_autocomplete, StructuralSuggestions, SuggestionMode};
pub use syntax::{validate_syntax, SyntaxReport};

use serde::Serialize;

use crate::infrastructure::config::DEFAULT_COMMAND_MARKER;
use tokenize::tokenize;

/// Knobs for [`parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Character that starts a command
    pub marker: char,
    pub case_sensitive: bool,
    /// Whether the registry may resolve aliases for this parse
    pub expand_aliases: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            marker: DEFAULT_COMMAND_MARKER,
            case_sensitive: false,
            expand_aliases: true,
        }
    }
}

/// One parsed chat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCommand {
    pub is_command: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<CommandArgs>,
    pub original_text: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unterminated_quote: bool,
}

impl ParsedCommand {
    fn not_command(input: &str) -> Self {
        Self {
            is_command: false,
            command: None,
            args: None,
            original_text: input.to_string(),
            unterminated_quote: false,
        }
    }

    /// Command name, if one was typed.
    pub fn name(&self) -> Option<&str> {
        self.command.as_deref().filter(|name| !name.is_empty())
    }
}

/// Parse one chat line.
pub fn parse(input: &str, options: &ParseOptions) -> ParsedCommand {
    let trimmed = input.trim();
    let Some(body) = trimmed.strip_prefix(options.marker) else {
        return ParsedCommand::not_command(input);
    };

    let tokenized = tokenize(body);
    let mut tokens = tokenized.tokens.into_iter();

    let command = if name_detached(body) {
        None
    } else {
        tokens
            .next()
            .map(|token| normalize_name(&token.text, options))
            .filter(|name| !name.is_empty())
    };

    ParsedCommand {
        is_command: true,
        command,
        args: Some(CommandArgs::from_tokens(tokens.collect())),
        original_text: input.to_string(),
        unterminated_quote: tokenized.unterminated_quote,
    }
}

/// The name must touch the marker: "/ attack" has no command name.
fn name_detached(body: &str) -> bool {
    body.starts_with(char::is_whitespace)
}

/// Strip one leading default marker and lowercase.
pub fn normalize_command(name: &str) -> String {
    normalize_name(name, &ParseOptions::default())
}

fn normalize_name(name: &str, options: &ParseOptions) -> String {
    let name = name.trim();
    let name = name.strip_prefix(options.marker).unwrap_or(name);
    if options.case_sensitive {
        name.to_string()
    } else {
        name.to_lowercase()
    }
}

/// Render a parsed command back to canonical text.
///
/// Plain text first, then targets, then flags. Re-parsing the output yields
/// the same command, targets, flags and plain text.
pub fn stringify(parsed: &ParsedCommand, options: &ParseOptions) -> String {
    if !parsed.is_command {
        return parsed.original_text.clone();
    }

    let mut parts = vec![format!(
        "{}{}",
        options.marker,
        parsed.command.as_deref().unwrap_or_default()
    )];

    if let Some(args) = &parsed.args {
        parts.extend(args.plain_text.iter().map(|text| quote_plain(text)));
        parts.extend(
            args.targets
                .iter()
                .map(|target| format!("{}{}", TARGET_MARKER, quote_inner(target))),
        );
        parts.extend(args.flags.iter().map(|(name, value)| match value {
            FlagValue::Switch => format!("{}{}", FLAG_PREFIX, quote_inner(name)),
            FlagValue::Value(v) => {
                format!("{}{}={}", FLAG_PREFIX, quote_inner(name), quote_inner(v))
            }
        }));
    }

    parts.join(" ")
}

fn needs_quotes(text: &str) -> bool {
    text.is_empty()
        || text
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\'' || c == '\\')
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Quote a plain-text token so it stays plain after re-parsing.
fn quote_plain(text: &str) -> String {
    if needs_quotes(text) || text.starts_with(TARGET_MARKER) || text.starts_with(FLAG_PREFIX) {
        escape(text)
    } else {
        text.to_string()
    }
}

/// Quote the part after a marker; the marker itself stays outside the quotes.
fn quote_inner(text: &str) -> String {
    if !text.is_empty() && needs_quotes(text) {
        escape(text)
    } else {
        text.to_string()
    }
}
