//! Command definitions.
//!
//! Every chat command implements [`CommandDefinition`]: static metadata plus
//! validate / execute / auto-complete. Commands only *describe* effects; the
//! event payload they return is applied (or not) by whoever owns game state.

mod ai_control;
mod attack;
mod cast;
mod defend;
mod heal;
mod movement;
mod roll;
pub(crate) mod support;
mod talk;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tabletalk_domain::{
    CharacterId, CharacterSnapshot, DiceParseError, DomainError, ExecutionContext,
};

use crate::infrastructure::ports::{ClockPort, RandomPort};
use crate::parser::CommandArgs;

pub use ai_control::AiControlCommand;
pub use attack::AttackCommand;
pub use cast::CastCommand;
pub use defend::DefendCommand;
pub use heal::HealCommand;
pub use movement::MoveCommand;
pub use roll::RollCommand;
pub use talk::TalkCommand;

/// Grouping used by help listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandCategory {
    Social,
    Combat,
    Magic,
    Movement,
    Support,
    Utility,
    Admin,
}

impl CommandCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Social => "Social",
            Self::Combat => "Combat",
            Self::Magic => "Magic",
            Self::Movement => "Movement",
            Self::Support => "Support",
            Self::Utility => "Utility",
            Self::Admin => "Admin",
        }
    }

    pub fn all() -> &'static [CommandCategory] {
        &[
            Self::Social,
            Self::Combat,
            Self::Magic,
            Self::Movement,
            Self::Support,
            Self::Utility,
            Self::Admin,
        ]
    }
}

impl fmt::Display for CommandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CommandCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::parse(format!("Unknown command category: {}", s)))
    }
}

/// Immutable description of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandMetadata {
    pub name: String,
    pub aliases: Vec<String>,
    pub description: String,
    /// Usage line, e.g. `/attack @target [--bonus=N]`
    pub syntax: String,
    pub category: CommandCategory,
    /// Needs a bound acting character
    pub requires_target: bool,
    pub requires_combat: bool,
    pub admin_only: bool,
}

impl CommandMetadata {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        syntax: impl Into<String>,
        category: CommandCategory,
    ) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: description.into(),
            syntax: syntax.into(),
            category,
            requires_target: false,
            requires_combat: false,
            admin_only: false,
        }
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn requires_target(mut self) -> Self {
        self.requires_target = true;
        self
    }

    pub fn requires_combat(mut self) -> Self {
        self.requires_combat = true;
        self
    }

    pub fn admin_only(mut self) -> Self {
        self.admin_only = true;
        self
    }

    /// Multi-line help text for `/help`-style listings.
    pub fn help_text(&self) -> String {
        let mut text = format!("{} - {}\nUsage: {}", self.name, self.description, self.syntax);
        if !self.aliases.is_empty() {
            text.push_str(&format!("\nAliases: {}", self.aliases.join(", ")));
        }
        let mut needs = Vec::new();
        if self.admin_only {
            needs.push("GM only");
        }
        if self.requires_combat {
            needs.push("combat only");
        }
        if self.requires_target {
            needs.push("needs an active character");
        }
        if !needs.is_empty() {
            text.push_str(&format!("\nRestrictions: {}", needs.join(", ")));
        }
        text
    }
}

/// Outcome of a command's own precondition checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
}

/// A command's own answer, before the runner wraps it in an envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionResult {
    pub fn success(message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            timestamp,
        }
    }

    pub fn failure(message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            timestamp,
        }
    }

    /// Attach a structured event payload.
    pub fn with_event<E: Serialize>(mut self, event: &E) -> Result<Self, CommandError> {
        self.data = Some(serde_json::to_value(event)?);
        Ok(self)
    }
}

/// Errors raised while executing a command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Dice error: {0}")]
    Dice(#[from] DiceParseError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("Unknown target '{0}'")]
    UnknownTarget(String),
    #[error("No acting character is bound to this session")]
    MissingActor,
    #[error("Could not encode event: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{0}")]
    Internal(String),
}

impl CommandError {
    /// Stable identifier for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Dice(_) => "dice",
            Self::Domain(_) => "domain",
            Self::UnknownTarget(_) => "unknown_target",
            Self::MissingActor => "missing_actor",
            Self::Serialization(_) => "serialization",
            Self::Internal(_) => "internal",
        }
    }
}

/// Reference to a character inside an event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRef {
    pub id: CharacterId,
    pub name: String,
}

impl From<&CharacterSnapshot> for CharacterRef {
    fn from(character: &CharacterSnapshot) -> Self {
        Self {
            id: character.id,
            name: character.name.clone(),
        }
    }
}

/// Contract shared by every chat command.
#[async_trait]
pub trait CommandDefinition: Send + Sync {
    fn metadata(&self) -> &CommandMetadata;

    /// Command-specific preconditions. Never has side effects.
    fn validate(&self, args: &CommandArgs, ctx: &ExecutionContext) -> ValidationResult;

    /// Compute the outcome. Async so future commands can await I/O.
    async fn execute(
        &self,
        args: &CommandArgs,
        ctx: &ExecutionContext,
    ) -> Result<ExecutionResult, CommandError>;

    /// Suggestions specific to this command: flags, names, values.
    fn autocomplete(&self, _args: &CommandArgs, _ctx: &ExecutionContext) -> Vec<String> {
        Vec::new()
    }
}

/// The built-in command set.
pub fn default_commands(
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
) -> Vec<Arc<dyn CommandDefinition>> {
    vec![
        Arc::new(TalkCommand::new(clock.clone())),
        Arc::new(AttackCommand::new(clock.clone(), random.clone())),
        Arc::new(DefendCommand::new(clock.clone(), random.clone())),
        Arc::new(CastCommand::new(clock.clone(), random.clone())),
        Arc::new(MoveCommand::new(clock.clone())),
        Arc::new(HealCommand::new(clock.clone(), random.clone())),
        Arc::new(RollCommand::new(clock.clone(), random)),
        Arc::new(AiControlCommand::new(clock)),
    ]
}
