//! Context-aware completion on top of the parser's structural pass.

use serde::Serialize;
use tabletalk_domain::ExecutionContext;

use super::fuzzy::similar_names;
use super::registry::CommandRegistry;
use crate::commands::support::target_token;
use crate::parser::{self, ParseOptions, SuggestionMode, FLAG_PREFIX, TARGET_MARKER};

/// Pseudo-targets offered alongside roster names.
pub const PSEUDO_TARGETS: &[&str] = &["all", "self", "target", "enemy", "ally"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteResult {
    pub mode: SuggestionMode,
    pub partial: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Replacement tokens for the fragment under the cursor
    pub suggestions: Vec<String>,
}

pub(crate) fn complete(
    registry: &CommandRegistry,
    partial_input: &str,
    ctx: &ExecutionContext,
    options: &ParseOptions,
    limit: usize,
) -> AutocompleteResult {
    let structural = parser::generate_autocomplete(partial_input, registry.lookup_keys(), options);
    let partial = structural.partial.clone();

    let mut suggestions = match structural.mode {
        SuggestionMode::None => Vec::new(),
        SuggestionMode::CommandName if structural.suggestions.is_empty() => {
            similar_names(&partial, registry.lookup_keys(), limit)
                .into_iter()
                .map(|name| format!("{}{}", options.marker, name))
                .collect()
        }
        SuggestionMode::CommandName => structural.suggestions,
        SuggestionMode::Target => target_suggestions(&partial, ctx),
        SuggestionMode::Flag | SuggestionMode::Argument => {
            let command = structural
                .command
                .as_deref()
                .and_then(|name| registry.resolve(name, options.expand_aliases));
            match command {
                Some(command) => filter_command_suggestions(
                    command.autocomplete(&structural.args, ctx),
                    structural.mode,
                    &partial,
                ),
                None => Vec::new(),
            }
        }
    };
    suggestions.truncate(limit);

    let command = structural
        .command
        .as_deref()
        .and_then(|name| registry.canonical_name(name))
        .map(str::to_string);

    AutocompleteResult {
        mode: structural.mode,
        partial,
        command,
        suggestions,
    }
}

/// Roster names containing the fragment (by name or id), then pseudo-targets.
fn target_suggestions(partial: &str, ctx: &ExecutionContext) -> Vec<String> {
    let needle = partial.to_lowercase();
    let mut out: Vec<String> = ctx
        .targetable_characters()
        .filter(|c| c.matches_partial(&needle))
        .map(|c| target_token(&c.name))
        .collect();
    out.extend(
        PSEUDO_TARGETS
            .iter()
            .filter(|word| word.starts_with(&needle))
            .map(|word| format!("{}{}", TARGET_MARKER, word)),
    );
    out
}

fn filter_command_suggestions(
    candidates: Vec<String>,
    mode: SuggestionMode,
    partial: &str,
) -> Vec<String> {
    let needle = partial.to_lowercase();
    candidates
        .into_iter()
        .filter(|candidate| match mode {
            SuggestionMode::Flag => candidate
                .strip_prefix(FLAG_PREFIX)
                .is_some_and(|rest| rest.to_lowercase().starts_with(&needle)),
            _ => needle.is_empty() || candidate.to_lowercase().starts_with(&needle),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{default_commands, test_support};
    use tabletalk_domain::{Permissions, SceneSnapshot};

    fn registry() -> CommandRegistry {
        CommandRegistry::with_commands(
            default_commands(test_support::clock(), test_support::random(10)),
            false,
        )
    }

    fn run(input: &str, ctx: &ExecutionContext) -> AutocompleteResult {
        complete(&registry(), input, ctx, &ParseOptions::default(), 10)
    }

    #[test]
    fn command_prefix_includes_aliases() {
        let t = test_support::table();
        let result = run("/a", &t.ctx);
        assert_eq!(result.mode, SuggestionMode::CommandName);
        assert_eq!(
            result.suggestions,
            vec!["/a", "/ai", "/aicontrol", "/atk", "/attack", "/auto"]
        );
    }

    #[test]
    fn unknown_prefix_falls_back_to_fuzzy() {
        let t = test_support::table();
        let result = run("/haal", &t.ctx);
        assert_eq!(result.suggestions[0], "/heal");
    }

    #[test]
    fn target_mode_filters_roster_and_pseudo_targets() {
        let t = test_support::table();
        let result = run("/attack @b", &t.ctx);
        assert_eq!(result.mode, SuggestionMode::Target);
        assert_eq!(result.command.as_deref(), Some("attack"));
        assert_eq!(result.suggestions, vec!["@Bob"]);

        let all = run("/heal @", &t.ctx);
        assert!(all.suggestions.contains(&"@Mira".to_string()));
        assert!(all.suggestions.contains(&"@self".to_string()));
        assert!(all.suggestions.ends_with(&["@enemy".to_string(), "@ally".to_string()]));
    }

    #[test]
    fn flag_mode_asks_the_command() {
        let t = test_support::table();
        let result = run("/defend --stance=p", &t.ctx);
        assert_eq!(result.mode, SuggestionMode::Flag);
        assert_eq!(result.suggestions, vec!["--stance=parry"]);

        let via_alias = run("/say --wh", &t.ctx);
        assert_eq!(via_alias.command.as_deref(), Some("talk"));
        assert_eq!(via_alias.suggestions, vec!["--whisper"]);
    }

    #[test]
    fn argument_mode_offers_locations() {
        let mut t = test_support::table();
        t.ctx.environment.current_scene =
            Some(SceneSnapshot::new("Crossroads").with_locations(["Old Mill", "Tavern"]));
        let result = run("/move ol", &t.ctx);
        assert_eq!(result.mode, SuggestionMode::Argument);
        assert_eq!(result.suggestions, vec!["Old Mill"]);

        let gm = t.ctx.clone().with_permissions(Permissions::gm());
        let everything = run("/go ", &gm);
        assert!(everything.suggestions.contains(&"Tavern".to_string()));
        assert!(everything.suggestions.contains(&"--dash".to_string()));
    }

    #[test]
    fn caps_and_ignores_non_commands() {
        let t = test_support::table();
        assert!(run("/cast fire --", &t.ctx).suggestions.len() <= 10);
        assert!(run("hello", &t.ctx).suggestions.is_empty());
        assert!(run("/nosuch --x", &t.ctx).suggestions.is_empty());
    }
}
