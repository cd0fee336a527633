//! Application state and composition.

use std::sync::Arc;

use serde::Serialize;
use tabletalk_domain::ExecutionContext;
use tokio::sync::{Mutex, RwLock};

use crate::infrastructure::{
    clock::{SystemClock, SystemRandom},
    config::RunnerConfig,
    ports::{ClockPort, RandomPort},
};
use crate::runner::{AutocompleteResult, CommandRunner, ResultEnvelope};

/// Line prefix asking for completions instead of execution.
pub const COMPLETION_PREFIX: char = '?';

/// Answer to one input line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Envelope(ResultEnvelope),
    Completion(AutocompleteResult),
}

/// Main application state.
///
/// Owns the runner behind a mutex so several tasks can share one table, and
/// the current context snapshot behind a read-write lock so a collaborator can
/// swap it between commands.
pub struct App {
    pub config: RunnerConfig,
    runner: Mutex<CommandRunner>,
    context: RwLock<ExecutionContext>,
    clock: Arc<dyn ClockPort>,
}

impl App {
    pub fn new(
        config: RunnerConfig,
        context: ExecutionContext,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        let runner = CommandRunner::new(&config, clock.clone(), random);
        tracing::info!(
            commands = runner.registry().len(),
            history_capacity = config.history_capacity,
            marker = %config.command_marker,
            "Command runner ready"
        );
        Self {
            config,
            runner: Mutex::new(runner),
            context: RwLock::new(context),
            clock,
        }
    }

    /// Compose with the system clock and thread RNG.
    pub fn with_system_ports(config: RunnerConfig, context: ExecutionContext) -> Self {
        Self::new(
            config,
            context,
            Arc::new(SystemClock::new()),
            Arc::new(SystemRandom::new()),
        )
    }

    /// Handle one input line; blank lines produce no reply.
    pub async fn handle_line(&self, line: &str) -> Option<Reply> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return None;
        }

        if let Some(partial) = line.trim_start().strip_prefix(COMPLETION_PREFIX) {
            let ctx = self.context.read().await;
            let runner = self.runner.lock().await;
            return Some(Reply::Completion(
                runner.generate_autocomplete(partial, &ctx),
            ));
        }

        let mut ctx = self.context.read().await.clone();
        ctx.timestamp = self.clock.now();

        let mut runner = self.runner.lock().await;
        let options = runner.execute_options();
        let envelope = runner.execute_text(line, &ctx, &options).await;
        Some(Reply::Envelope(envelope))
    }

    pub async fn context(&self) -> ExecutionContext {
        self.context.read().await.clone()
    }

    pub async fn replace_context(&self, context: ExecutionContext) {
        *self.context.write().await = context;
    }

    /// Run `f` with exclusive access to the runner (registry, history).
    pub async fn with_runner<R>(&self, f: impl FnOnce(&mut CommandRunner) -> R) -> R {
        let mut runner = self.runner.lock().await;
        f(&mut runner)
    }
}
