//! Command runner - registry, staged dispatch pipeline and history.
//!
//! Every call to [`CommandRunner::execute_text`] walks the same stages and
//! stops at the first failure:
//!
//! 1. parse (not a command / missing name)
//! 2. resolve name or alias (with "did you mean" suggestions)
//! 3. structural syntax check
//! 4. command-specific validation
//! 5. permission checks from metadata
//! 6. execute, catching errors and panics
//! 7. record history
//!
//! Nothing escapes as an error; every outcome is a [`ResultEnvelope`].

mod autocomplete;
mod fuzzy;
mod history;
mod outcome;
mod permissions;
mod registry;

pub use autocomplete::{AutocompleteResult, PSEUDO_TARGETS};
pub use fuzzy::{levenshtein, similar_names, MAX_EDIT_DISTANCE};
pub use history::{ExecutionHistory, ExecutionRecord, HistoryStats};
pub use outcome::{ErrorInfo, OutcomeTag, ResultEnvelope};
pub use permissions::{check_permissions, PermissionDenied};
pub use registry::CommandRegistry;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use serde::Serialize;
use tabletalk_domain::ExecutionContext;

use crate::commands::{
    default_commands, CommandCategory, CommandDefinition, CommandMetadata,
};
use crate::infrastructure::config::RunnerConfig;
use crate::infrastructure::ports::{ClockPort, RandomPort};
use crate::parser::{self, CommandArgs, ParseOptions, ParsedCommand};

/// Most "did you mean" names offered for an unknown command.
pub const MAX_NOT_FOUND_SUGGESTIONS: usize = 5;

/// Per-call knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOptions {
    pub record_history: bool,
    pub parse: ParseOptions,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            record_history: true,
            parse: ParseOptions::default(),
        }
    }
}

/// Help entry for one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandHelp {
    pub metadata: CommandMetadata,
    pub help_text: String,
}

pub struct CommandRunner {
    registry: CommandRegistry,
    history: ExecutionHistory,
    clock: Arc<dyn ClockPort>,
    parse_options: ParseOptions,
    max_suggestions: usize,
}

impl CommandRunner {
    /// Runner seeded with the built-in command set.
    pub fn new(
        config: &RunnerConfig,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        let mut runner = Self::empty(config, clock.clone());
        for command in default_commands(clock, random) {
            runner.registry.register(command);
        }
        runner
    }

    /// Runner with no commands registered.
    pub fn empty(config: &RunnerConfig, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            registry: CommandRegistry::empty(config.case_sensitive),
            history: ExecutionHistory::new(config.history_capacity),
            clock,
            parse_options: ParseOptions {
                marker: config.command_marker,
                case_sensitive: config.case_sensitive,
                expand_aliases: true,
            },
            max_suggestions: config.max_suggestions,
        }
    }

    /// Options matching this runner's configuration.
    pub fn execute_options(&self) -> ExecuteOptions {
        ExecuteOptions {
            record_history: true,
            parse: self.parse_options,
        }
    }

    pub fn parse_options(&self) -> &ParseOptions {
        &self.parse_options
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Parse and run one line of chat input.
    pub async fn execute_text(
        &mut self,
        input: &str,
        ctx: &ExecutionContext,
        options: &ExecuteOptions,
    ) -> ResultEnvelope {
        let parsed = parser::parse(input, &options.parse);
        self.execute_command(&parsed, ctx, options).await
    }

    /// Run an already-parsed command through the pipeline.
    pub async fn execute_command(
        &mut self,
        parsed: &ParsedCommand,
        ctx: &ExecutionContext,
        options: &ExecuteOptions,
    ) -> ResultEnvelope {
        let started = Instant::now();
        let input = parsed.original_text.as_str();

        if !parsed.is_command {
            return ResultEnvelope::new(OutcomeTag::NotCommand, "Not a command", input)
                .timed(elapsed_ms(started));
        }

        let Some(name) = parsed.name() else {
            tracing::debug!(input = %input, "Command marker without a name");
            return ResultEnvelope::new(
                OutcomeTag::InvalidCommand,
                format!("Type a command name after '{}'", options.parse.marker),
                input,
            )
            .timed(elapsed_ms(started));
        };

        let Some(command) = self
            .registry
            .resolve(name, options.parse.expand_aliases)
            .cloned()
        else {
            let suggestions = self.similar_commands(name, MAX_NOT_FOUND_SUGGESTIONS);
            tracing::debug!(command = %name, suggestions = ?suggestions, "Unknown command");
            return ResultEnvelope::new(
                OutcomeTag::CommandNotFound,
                format!("Unknown command '{}{}'", options.parse.marker, name),
                input,
            )
            .with_suggestions(suggestions)
            .timed(elapsed_ms(started));
        };

        let canonical = command.metadata().name.clone();
        let args = parsed.args.clone().unwrap_or_default();

        let syntax = parser::validate_syntax(parsed);
        if !syntax.is_valid() {
            tracing::debug!(command = %canonical, errors = ?syntax.errors, "Syntax check failed");
            return ResultEnvelope::new(
                OutcomeTag::SyntaxError,
                format!("Invalid syntax: {}", syntax.errors.join("; ")),
                input,
            )
            .with_command(canonical)
            .with_validation(syntax.errors, syntax.warnings)
            .timed(elapsed_ms(started));
        }

        let validation = command.validate(&args, ctx);
        let mut warnings = syntax.warnings;
        warnings.extend(validation.warnings.iter().cloned());
        if !validation.is_valid() {
            tracing::debug!(command = %canonical, errors = ?validation.errors, "Validation failed");
            return ResultEnvelope::new(
                OutcomeTag::ValidationError,
                validation.errors.join("; "),
                input,
            )
            .with_command(canonical)
            .with_validation(validation.errors, warnings)
            .timed(elapsed_ms(started));
        }

        if let Err(denied) = check_permissions(command.metadata(), ctx) {
            tracing::warn!(
                command = %canonical,
                user_id = %ctx.user_id,
                reason = %denied,
                "Permission denied"
            );
            return ResultEnvelope::new(OutcomeTag::PermissionDenied, denied.to_string(), input)
                .with_command(canonical)
                .with_validation(Vec::new(), warnings)
                .timed(elapsed_ms(started));
        }

        let envelope = self
            .run(command.as_ref(), &args, ctx, input)
            .await
            .with_command(canonical.clone())
            .with_validation(Vec::new(), warnings)
            .timed(elapsed_ms(started));

        if options.record_history {
            self.history.push(ExecutionRecord {
                command: canonical,
                args,
                context: ctx.clone(),
                result: envelope.clone(),
                timestamp_ms: self.clock.now().timestamp_millis(),
                execution_time_ms: envelope.execution_time_ms,
            });
        }

        envelope
    }

    async fn run(
        &self,
        command: &dyn CommandDefinition,
        args: &CommandArgs,
        ctx: &ExecutionContext,
        input: &str,
    ) -> ResultEnvelope {
        let name = &command.metadata().name;
        let outcome = AssertUnwindSafe(command.execute(args, ctx))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) if result.success => {
                tracing::info!(command = %name, user_id = %ctx.user_id, "Command executed");
                ResultEnvelope::new(OutcomeTag::Success, result.message.clone(), input)
                    .with_result(result)
            }
            Ok(Ok(result)) => {
                tracing::warn!(command = %name, message = %result.message, "Command reported failure");
                ResultEnvelope::new(OutcomeTag::CommandFailed, result.message.clone(), input)
                    .with_result(result)
            }
            Ok(Err(e)) => {
                tracing::error!(command = %name, error = %e, "Command execution failed");
                ResultEnvelope::new(
                    OutcomeTag::ExecutionError,
                    format!("Command failed: {}", e),
                    input,
                )
                .with_error(e.kind(), e.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(command = %name, panic = %message, "Command panicked");
                ResultEnvelope::new(
                    OutcomeTag::ExecutionError,
                    "Command failed unexpectedly",
                    input,
                )
                .with_error("panic", message)
            }
        }
    }

    fn similar_commands(&self, name: &str, limit: usize) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for candidate in similar_names(name, self.registry.lookup_keys(), usize::MAX) {
            if let Some(canonical) = self.registry.canonical_name(&candidate) {
                if !out.iter().any(|n| n == canonical) {
                    out.push(canonical.to_string());
                }
            }
            if out.len() == limit {
                break;
            }
        }
        out
    }

    // =========================================================================
    // Auto-complete and discovery
    // =========================================================================

    /// Suggestions for a partially typed line.
    pub fn generate_autocomplete(
        &self,
        partial_input: &str,
        ctx: &ExecutionContext,
    ) -> AutocompleteResult {
        autocomplete::complete(
            &self.registry,
            partial_input,
            ctx,
            &self.parse_options,
            self.max_suggestions,
        )
    }

    /// Metadata of every command (optionally one category), sorted by name.
    pub fn list_commands(&self, category: Option<CommandCategory>) -> Vec<CommandMetadata> {
        let mut commands: Vec<CommandMetadata> = self
            .registry
            .commands()
            .map(|command| command.metadata())
            .filter(|meta| category.map_or(true, |c| meta.category == c))
            .cloned()
            .collect();
        commands.sort_by(|a, b| a.name.cmp(&b.name));
        commands
    }

    /// Help for a name or alias.
    pub fn command_help(&self, name: &str) -> Option<CommandHelp> {
        let name = parser::normalize_command(name);
        self.registry.get(&name).map(|command| {
            let metadata = command.metadata().clone();
            CommandHelp {
                help_text: metadata.help_text(),
                metadata,
            }
        })
    }

    // =========================================================================
    // Registry
    // =========================================================================

    /// Add or replace a command. Returns true when one was replaced.
    pub fn register(&mut self, command: Arc<dyn CommandDefinition>) -> bool {
        let name = command.metadata().name.clone();
        let replaced = self.registry.register(command).is_some();
        tracing::info!(command = %name, replaced, "Command registered");
        replaced
    }

    /// Remove a command by name or alias. Returns true when it existed.
    pub fn unregister(&mut self, name: &str) -> bool {
        let removed = self.registry.unregister(name).is_some();
        if removed {
            tracing::info!(command = %name, "Command unregistered");
        }
        removed
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    // =========================================================================
    // History
    // =========================================================================

    pub fn history(&self) -> &ExecutionHistory {
        &self.history
    }

    pub fn recent_history(&self, n: usize) -> Vec<&ExecutionRecord> {
        self.history.recent(n)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn history_stats(&self) -> HistoryStats {
        self.history.stats()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{self, fixed_now};
    use crate::commands::{CommandError, ExecutionResult, ValidationResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tabletalk_domain::Permissions;

    fn runner() -> CommandRunner {
        CommandRunner::new(
            &RunnerConfig::default(),
            test_support::clock(),
            test_support::random(10),
        )
    }

    async fn run(runner: &mut CommandRunner, input: &str, ctx: &ExecutionContext) -> ResultEnvelope {
        let options = runner.execute_options();
        runner.execute_text(input, ctx, &options).await
    }

    enum Behaviour {
        Fail,
        Error,
        Panic,
    }

    struct Faulty(CommandMetadata, Behaviour);

    #[async_trait]
    impl CommandDefinition for Faulty {
        fn metadata(&self) -> &CommandMetadata {
            &self.0
        }

        fn validate(&self, _: &CommandArgs, _: &ExecutionContext) -> ValidationResult {
            let mut result = ValidationResult::ok();
            result.warn("careful");
            result
        }

        async fn execute(
            &self,
            _: &CommandArgs,
            _: &ExecutionContext,
        ) -> Result<ExecutionResult, CommandError> {
            match self.1 {
                Behaviour::Fail => Ok(ExecutionResult::failure("fizzled", fixed_now())),
                Behaviour::Error => Err(CommandError::Internal("boom".into())),
                Behaviour::Panic => panic!("kaboom"),
            }
        }
    }

    fn faulty(name: &str, behaviour: Behaviour) -> Arc<dyn CommandDefinition> {
        Arc::new(Faulty(
            CommandMetadata::new(name, "test", format!("/{}", name), CommandCategory::Utility),
            behaviour,
        ))
    }

    #[tokio::test]
    async fn plain_chat_is_not_a_command() {
        let t = test_support::table();
        let envelope = run(&mut runner(), "hello table", &t.ctx).await;
        assert_eq!(envelope.outcome_tag, OutcomeTag::NotCommand);
        assert_eq!(envelope.original_input, "hello table");
    }

    #[tokio::test]
    async fn bare_marker_is_invalid() {
        let t = test_support::table();
        let mut r = runner();
        assert_eq!(run(&mut r, "/", &t.ctx).await.outcome_tag, OutcomeTag::InvalidCommand);
        assert_eq!(run(&mut r, "/  roll", &t.ctx).await.outcome_tag, OutcomeTag::InvalidCommand);
    }

    #[tokio::test]
    async fn unknown_command_suggests_canonical_names() {
        let t = test_support::table();
        let envelope = run(&mut runner(), "/atack @Bob", &t.ctx).await;
        assert_eq!(envelope.outcome_tag, OutcomeTag::CommandNotFound);
        let suggestions = envelope.suggestions.unwrap();
        assert_eq!(suggestions[0], "attack");
        assert!(suggestions.len() <= MAX_NOT_FOUND_SUGGESTIONS);
    }

    #[tokio::test]
    async fn syntax_errors_stop_before_validation() {
        let t = test_support::table();
        let envelope = run(&mut runner(), "/attack @", &t.ctx).await;
        assert_eq!(envelope.outcome_tag, OutcomeTag::SyntaxError);
        assert_eq!(envelope.command.as_deref(), Some("attack"));
        assert!(envelope.validation_errors.is_some());
    }

    #[tokio::test]
    async fn validation_errors_carry_warnings() {
        let mut t = test_support::table();
        t.ctx.environment.current_turn = Some(t.bob.id);
        let envelope = run(&mut runner(), "/attack @Bob --bonus=x", &t.ctx).await;
        assert_eq!(envelope.outcome_tag, OutcomeTag::ValidationError);
        assert_eq!(envelope.validation_warnings.unwrap(), vec!["It is not your turn"]);
    }

    #[tokio::test]
    async fn admin_only_is_denied_to_players() {
        let t = test_support::table();
        let mut r = runner();
        let denied = run(&mut r, "/ai @Bob on", &t.ctx).await;
        assert_eq!(denied.outcome_tag, OutcomeTag::PermissionDenied);
        assert_eq!(denied.message, "Only the GM can use this command");

        let gm = t.ctx.clone().with_permissions(Permissions::gm());
        let allowed = run(&mut r, "/auto @Bob on", &gm).await;
        assert_eq!(allowed.outcome_tag, OutcomeTag::Success);
        assert_eq!(allowed.command.as_deref(), Some("ai"));
    }

    #[tokio::test]
    async fn success_envelope_carries_data_and_history() {
        let t = test_support::table();
        let mut r = runner();
        let envelope = run(&mut r, "/r 2d6+1 --reason=test", &t.ctx).await;

        assert!(envelope.success);
        assert_eq!(envelope.data.as_ref().unwrap()["total"], 13);
        assert_eq!(envelope.command_result.as_ref().unwrap().message, envelope.message);
        assert_eq!(r.history().len(), 1);
        assert_eq!(r.history().last().unwrap().command, "roll");
        assert_eq!(
            r.history().last().unwrap().timestamp_ms,
            fixed_now().timestamp_millis()
        );
    }

    #[tokio::test]
    async fn failures_errors_and_panics_are_contained() {
        let t = test_support::table();
        let mut r = runner();
        r.register(faulty("fizzle", Behaviour::Fail));
        r.register(faulty("broken", Behaviour::Error));
        r.register(faulty("panicky", Behaviour::Panic));

        let failed = run(&mut r, "/fizzle", &t.ctx).await;
        assert_eq!(failed.outcome_tag, OutcomeTag::CommandFailed);
        assert_eq!(failed.validation_warnings.unwrap(), vec!["careful"]);

        let errored = run(&mut r, "/broken", &t.ctx).await;
        assert_eq!(errored.outcome_tag, OutcomeTag::ExecutionError);
        assert_eq!(errored.error.unwrap().kind, "internal");

        let panicked = run(&mut r, "/panicky", &t.ctx).await;
        assert_eq!(panicked.outcome_tag, OutcomeTag::ExecutionError);
        assert_eq!(panicked.error.unwrap().message, "kaboom");

        assert_eq!(r.history().len(), 3);
        assert_eq!(r.history_stats().succeeded, 0);
    }

    #[tokio::test]
    async fn history_skips_unexecuted_and_opted_out_calls() {
        let t = test_support::table();
        let mut r = runner();
        run(&mut r, "/nope", &t.ctx).await;
        run(&mut r, "/ai @Bob", &t.ctx).await;

        let options = ExecuteOptions {
            record_history: false,
            ..r.execute_options()
        };
        r.execute_text("/roll", &t.ctx, &options).await;
        assert!(r.history().is_empty());
    }

    #[tokio::test]
    async fn aliases_can_be_disabled_per_call() {
        let t = test_support::table();
        let mut r = runner();
        let mut options = r.execute_options();
        options.parse.expand_aliases = false;
        let envelope = r.execute_text("/r", &t.ctx, &options).await;
        assert_eq!(envelope.outcome_tag, OutcomeTag::CommandNotFound);
    }

    #[test]
    fn list_and_help() {
        let r = runner();
        let names: Vec<String> = r.list_commands(None).into_iter().map(|m| m.name).collect();
        assert_eq!(
            names,
            vec!["ai", "attack", "cast", "defend", "heal", "move", "roll", "talk"]
        );
        let combat: Vec<String> = r
            .list_commands(Some(CommandCategory::Combat))
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(combat, vec!["attack", "defend"]);

        let help = r.command_help("/ATK").unwrap();
        assert_eq!(help.metadata.name, "attack");
        assert!(help.help_text.contains("Usage: /attack"));
        assert!(r.command_help("fly").is_none());
    }

    #[tokio::test]
    async fn register_counts_calls_through_runner() {
        struct Counter(CommandMetadata, Arc<AtomicUsize>);

        #[async_trait]
        impl CommandDefinition for Counter {
            fn metadata(&self) -> &CommandMetadata {
                &self.0
            }
            fn validate(&self, _: &CommandArgs, _: &ExecutionContext) -> ValidationResult {
                ValidationResult::ok()
            }
            async fn execute(
                &self,
                _: &CommandArgs,
                ctx: &ExecutionContext,
            ) -> Result<ExecutionResult, CommandError> {
                self.1.fetch_add(1, Ordering::SeqCst);
                Ok(ExecutionResult::success("counted", ctx.timestamp))
            }
        }

        let t = test_support::table();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut r = CommandRunner::empty(&RunnerConfig::default(), test_support::clock());
        r.register(Arc::new(Counter(
            CommandMetadata::new("count", "c", "/count", CommandCategory::Utility)
                .aliases(["cnt"]),
            calls.clone(),
        )));

        run(&mut r, "/cnt", &t.ctx).await;
        run(&mut r, "/COUNT", &t.ctx).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(r.unregister("count"));
        assert_eq!(
            run(&mut r, "/cnt", &t.ctx).await.outcome_tag,
            OutcomeTag::CommandNotFound
        );
    }

    #[test]
    fn autocomplete_uses_configured_limit() {
        let t = test_support::table();
        let config = RunnerConfig {
            max_suggestions: 2,
            ..RunnerConfig::default()
        };
        let r = CommandRunner::new(&config, test_support::clock(), test_support::random(1));
        assert_eq!(r.generate_autocomplete("/a", &t.ctx).suggestions.len(), 2);
    }
}
