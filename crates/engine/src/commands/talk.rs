use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tabletalk_domain::ExecutionContext;

use super::support::{self, check_targets, flag_tokens, join_names, roster_tokens};
use super::{
    CharacterRef, CommandCategory, CommandDefinition, CommandError, CommandMetadata,
    ExecutionResult, ValidationResult,
};
use crate::infrastructure::ports::ClockPort;
use crate::parser::CommandArgs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechMode {
    Say,
    Whisper,
    Shout,
    OutOfCharacter,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechEvent {
    speaker: Option<CharacterRef>,
    speaker_name: String,
    listeners: Vec<CharacterRef>,
    text: String,
    mode: SpeechMode,
    timestamp: DateTime<Utc>,
}

/// `/talk` - in-character speech, whispers and out-of-character chatter.
pub struct TalkCommand {
    metadata: CommandMetadata,
    clock: Arc<dyn ClockPort>,
}

impl TalkCommand {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        let metadata = CommandMetadata::new(
            "talk",
            "Speak in character, optionally to specific characters",
            "/talk <text> [@target...] [--whisper] [--shout] [--ooc]",
            CommandCategory::Social,
        )
        .aliases(["say", "t"]);
        Self { metadata, clock }
    }

    fn mode(args: &CommandArgs) -> SpeechMode {
        if args.is_set("ooc") {
            SpeechMode::OutOfCharacter
        } else if args.is_set("whisper") {
            SpeechMode::Whisper
        } else if args.is_set("shout") {
            SpeechMode::Shout
        } else {
            SpeechMode::Say
        }
    }
}

#[async_trait]
impl CommandDefinition for TalkCommand {
    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn validate(&self, args: &CommandArgs, ctx: &ExecutionContext) -> ValidationResult {
        let mut result = ValidationResult::ok();

        if args.text().trim().is_empty() {
            result.error("Nothing to say");
        }
        if args.is_set("whisper") && args.is_set("shout") {
            result.error("Cannot whisper and shout at the same time");
        }
        if args.is_set("whisper") && args.targets.is_empty() {
            result.error("Whispering needs at least one @target");
        }
        check_targets(args, ctx, &mut result);

        if ctx.current_character.is_none() && !ctx.permissions.is_gm && !args.is_set("ooc") {
            result.warn("No character is bound; speaking anonymously");
        }

        result
    }

    async fn execute(
        &self,
        args: &CommandArgs,
        ctx: &ExecutionContext,
    ) -> Result<ExecutionResult, CommandError> {
        let listeners: Vec<CharacterRef> = support::resolve_all(args, ctx)?
            .into_iter()
            .map(CharacterRef::from)
            .collect();
        let names: Vec<&str> = listeners.iter().map(|c| c.name.as_str()).collect();
        let speaker = ctx.actor_name().to_string();
        let text = args.text();
        let mode = Self::mode(args);

        let message = match (mode, names.is_empty()) {
            (SpeechMode::OutOfCharacter, _) => format!("(OOC) {}: {}", speaker, text),
            (SpeechMode::Whisper, _) => {
                format!("{} whispers to {}: \"{}\"", speaker, join_names(&names), text)
            }
            (SpeechMode::Shout, true) => format!("{} shouts: \"{}\"", speaker, text),
            (SpeechMode::Shout, false) => {
                format!("{} shouts at {}: \"{}\"", speaker, join_names(&names), text)
            }
            (SpeechMode::Say, true) => format!("{} says: \"{}\"", speaker, text),
            (SpeechMode::Say, false) => {
                format!("{} says to {}: \"{}\"", speaker, join_names(&names), text)
            }
        };

        let timestamp = self.clock.now();
        let event = SpeechEvent {
            speaker: support::actor_ref(ctx),
            speaker_name: speaker,
            listeners,
            text,
            mode,
            timestamp,
        };
        ExecutionResult::success(message, timestamp).with_event(&event)
    }

    fn autocomplete(&self, _args: &CommandArgs, ctx: &ExecutionContext) -> Vec<String> {
        let mut out = flag_tokens(&["whisper", "shout", "ooc"]);
        out.extend(roster_tokens(ctx, false));
        out
    }
}
