//! Result envelope and the closed outcome taxonomy.

use std::fmt;

use serde::Serialize;

use crate::commands::ExecutionResult;

/// Exactly one of these tags is attached to every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeTag {
    Success,
    NotCommand,
    InvalidCommand,
    CommandNotFound,
    SyntaxError,
    ValidationError,
    PermissionDenied,
    /// The command ran and reported `success: false`
    CommandFailed,
    /// The command returned an error or panicked
    ExecutionError,
}

impl OutcomeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotCommand => "not_command",
            Self::InvalidCommand => "invalid_command",
            Self::CommandNotFound => "command_not_found",
            Self::SyntaxError => "syntax_error",
            Self::ValidationError => "validation_error",
            Self::PermissionDenied => "permission_denied",
            Self::CommandFailed => "command_failed",
            Self::ExecutionError => "execution_error",
        }
    }

    /// True when the command's `execute` was reached.
    pub fn was_executed(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::CommandFailed | Self::ExecutionError
        )
    }
}

impl fmt::Display for OutcomeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub kind: String,
    pub message: String,
}

/// What the dispatcher hands back for every input line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    pub success: bool,
    pub outcome_tag: OutcomeTag,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub original_input: String,
    pub execution_time_ms: u64,
    /// Canonical name of the resolved command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_result: Option<ExecutionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl ResultEnvelope {
    pub fn new(
        outcome_tag: OutcomeTag,
        message: impl Into<String>,
        original_input: impl Into<String>,
    ) -> Self {
        Self {
            success: outcome_tag == OutcomeTag::Success,
            outcome_tag,
            message: message.into(),
            data: None,
            original_input: original_input.into(),
            execution_time_ms: 0,
            command: None,
            command_result: None,
            suggestions: None,
            validation_errors: None,
            validation_warnings: None,
            error: None,
        }
    }

    pub fn with_command(mut self, name: impl Into<String>) -> Self {
        self.command = Some(name.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = Some(suggestions);
        self
    }

    /// Attach validation messages; empty lists are left out.
    pub fn with_validation(mut self, errors: Vec<String>, warnings: Vec<String>) -> Self {
        self.validation_errors = Some(errors).filter(|e| !e.is_empty());
        self.validation_warnings = Some(warnings).filter(|w| !w.is_empty());
        self
    }

    pub fn with_result(mut self, result: ExecutionResult) -> Self {
        self.data = result.data.clone();
        self.command_result = Some(result);
        self
    }

    pub fn with_error(mut self, kind: impl Into<String>, message: impl Into<String>) -> Self {
        self.error = Some(ErrorInfo {
            kind: kind.into(),
            message: message.into(),
        });
        self
    }

    pub fn timed(mut self, execution_time_ms: u64) -> Self {
        self.execution_time_ms = execution_time_ms;
        self
    }
}
