//! Shared setup for end-to-end tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tabletalk_domain::{ExecutionContext, SessionId, UserId};

use crate::commands::{
    test_support, CommandCategory, CommandDefinition, CommandError, CommandMetadata,
    ExecutionResult, ValidationResult,
};
use crate::infrastructure::config::RunnerConfig;
use crate::parser::CommandArgs;
use crate::runner::{CommandRunner, ExecuteOptions, ResultEnvelope};

/// Runner with the built-in commands and dice fixed at `die`.
pub fn runner_with_dice(config: &RunnerConfig, die: i32) -> CommandRunner {
    CommandRunner::new(config, test_support::clock(), test_support::random(die))
}

/// Context with nobody bound and no combat.
pub fn bare_context() -> ExecutionContext {
    ExecutionContext::new(UserId::new(), SessionId::new(), test_support::fixed_now())
}

pub async fn dispatch(
    runner: &mut CommandRunner,
    input: &str,
    ctx: &ExecutionContext,
) -> ResultEnvelope {
    let options = runner.execute_options();
    runner.execute_text(input, ctx, &options).await
}

pub async fn dispatch_unrecorded(
    runner: &mut CommandRunner,
    input: &str,
    ctx: &ExecutionContext,
) -> ResultEnvelope {
    let options = ExecuteOptions {
        record_history: false,
        ..runner.execute_options()
    };
    runner.execute_text(input, ctx, &options).await
}

/// Combat-only command that counts how often `execute` runs.
pub struct CountingCombatCommand {
    metadata: CommandMetadata,
    calls: Arc<AtomicUsize>,
    now: DateTime<Utc>,
}

impl CountingCombatCommand {
    pub fn new(calls: Arc<AtomicUsize>) -> Self {
        Self {
            metadata: CommandMetadata::new(
                "rally",
                "Rally allies in combat",
                "/rally",
                CommandCategory::Combat,
            )
            .aliases(["cheer"])
            .requires_combat(),
            calls,
            now: test_support::fixed_now(),
        }
    }
}

#[async_trait]
impl CommandDefinition for CountingCombatCommand {
    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn validate(&self, _args: &CommandArgs, _ctx: &ExecutionContext) -> ValidationResult {
        ValidationResult::ok()
    }

    async fn execute(
        &self,
        _args: &CommandArgs,
        _ctx: &ExecutionContext,
    ) -> Result<ExecutionResult, CommandError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ExecutionResult::success("Rallied", self.now))
    }
}
