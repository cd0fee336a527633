//! Structural auto-complete: works out *what* is being typed, not what exists.

use serde::Serialize;

use super::args::{CommandArgs, FLAG_PREFIX, TARGET_MARKER};
use super::tokenize::tokenize;
use super::{name_detached, normalize_name, ParseOptions};

/// What the token under the cursor is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionMode {
    /// Not a command line at all
    None,
    /// Still typing the command name
    CommandName,
    /// Typing a `@target`
    Target,
    /// Typing a `--flag`
    Flag,
    /// Typing free text after the command name
    Argument,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralSuggestions {
    pub mode: SuggestionMode,
    /// The fragment under the cursor, marker stripped
    pub partial: String,
    /// Normalized command name once it has been typed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Tokens already completed before the fragment
    #[serde(skip)]
    pub args: CommandArgs,
    /// Command-name matches (command mode only)
    pub suggestions: Vec<String>,
}

impl StructuralSuggestions {
    fn none() -> Self {
        Self {
            mode: SuggestionMode::None,
            partial: String::new(),
            command: None,
            args: CommandArgs::default(),
            suggestions: Vec::new(),
        }
    }

    pub fn is_target_suggestion(&self) -> bool {
        self.mode == SuggestionMode::Target
    }

    pub fn is_flag_suggestion(&self) -> bool {
        self.mode == SuggestionMode::Flag
    }
}

/// Classify a partial command line.
///
/// Command-name mode returns prefix-matched names from `known_commands`,
/// sorted and prefixed with the marker. Target and flag modes only report the
/// fragment; resolving it against a roster or a command's vocabulary is the
/// caller's job.
pub fn generate_autocomplete<'a, I>(
    partial_input: &str,
    known_commands: I,
    options: &ParseOptions,
) -> StructuralSuggestions
where
    I: IntoIterator<Item = &'a str>,
{
    let input = partial_input.trim_start();
    let Some(body) = input.strip_prefix(options.marker) else {
        return StructuralSuggestions::none();
    };
    if name_detached(body) {
        return StructuralSuggestions::none();
    }

    if !body.chars().any(char::is_whitespace) {
        let partial = normalize_name(body, options);
        let mut suggestions: Vec<String> = known_commands
            .into_iter()
            .filter(|name| {
                if options.case_sensitive {
                    name.starts_with(&partial)
                } else {
                    name.to_lowercase().starts_with(&partial)
                }
            })
            .map(|name| format!("{}{}", options.marker, name))
            .collect();
        suggestions.sort();
        suggestions.dedup();

        return StructuralSuggestions {
            mode: SuggestionMode::CommandName,
            partial,
            command: None,
            args: CommandArgs::default(),
            suggestions,
        };
    }

    let tokenized = tokenize(body);
    let mut tokens = tokenized.tokens;
    if tokens.is_empty() {
        return StructuralSuggestions::none();
    }
    let command = normalize_name(&tokens.remove(0).text, options);

    // Cursor on a fresh token: nothing typed yet.
    let current = if tokenized.trailing_space {
        None
    } else {
        tokens.pop()
    };

    let (mode, partial) = match current {
        None => (SuggestionMode::Argument, String::new()),
        Some(token) if !token.literal && token.text.starts_with(FLAG_PREFIX) => (
            SuggestionMode::Flag,
            token.text[FLAG_PREFIX.len()..].to_string(),
        ),
        Some(token) if !token.literal && token.text.starts_with(TARGET_MARKER) => (
            SuggestionMode::Target,
            token.text[TARGET_MARKER.len_utf8()..].to_string(),
        ),
        Some(token) => (SuggestionMode::Argument, token.text),
    };

    StructuralSuggestions {
        mode,
        partial,
        command: Some(command).filter(|c| !c.is_empty()),
        args: CommandArgs::from_tokens(tokens),
        suggestions: Vec::new(),
    }
}
