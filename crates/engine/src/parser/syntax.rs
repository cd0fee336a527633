//! Structural checks that never look at game state.

use serde::Serialize;

use super::ParsedCommand;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyntaxReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl SyntaxReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check targets and flags for structural problems.
///
/// Empty targets and nameless flags are errors; whitespace inside a target
/// and an unterminated quote are warnings.
pub fn validate_syntax(parsed: &ParsedCommand) -> SyntaxReport {
    let mut report = SyntaxReport::default();
    let Some(args) = parsed.args.as_ref().filter(|_| parsed.is_command) else {
        return report;
    };

    for (idx, target) in args.targets.iter().enumerate() {
        if target.trim().is_empty() {
            report
                .errors
                .push(format!("Target #{} is empty", idx + 1));
        } else if target.chars().any(char::is_whitespace) {
            report.warnings.push(format!(
                "Target '{}' contains whitespace; names are matched exactly",
                target
            ));
        }
    }

    if args.flags.names().any(|name| name.trim().is_empty()) {
        report.errors.push("Flag name cannot be empty".to_string());
    }

    if parsed.unterminated_quote {
        report
            .warnings
            .push("Unterminated quote; text was read to the end of the line".to_string());
    }

    report
}
