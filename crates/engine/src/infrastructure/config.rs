//! Runner configuration

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;
pub const DEFAULT_MAX_SUGGESTIONS: usize = 10;
pub const DEFAULT_COMMAND_MARKER: char = '/';

/// Characters already meaning something else on a chat line.
const RESERVED_MARKERS: [char; 3] = ['@', '-', '?'];

/// Interpreter configuration loaded from environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Maximum number of execution records kept in memory
    pub history_capacity: usize,
    /// Character that turns a chat line into a command
    pub command_marker: char,
    /// Whether command names must match case exactly
    pub case_sensitive: bool,
    /// Cap on auto-complete suggestion lists
    pub max_suggestions: usize,
    /// Optional JSON snapshot used by the host binary as its execution context
    pub context_path: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            command_marker: DEFAULT_COMMAND_MARKER,
            case_sensitive: false,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            context_path: None,
        }
    }
}

impl RunnerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let history_capacity = match lookup("TABLETALK_HISTORY_CAPACITY") {
            Some(raw) => raw
                .trim()
                .parse()
                .context("TABLETALK_HISTORY_CAPACITY must be a non-negative integer")?,
            None => defaults.history_capacity,
        };
        if history_capacity == 0 {
            bail!("TABLETALK_HISTORY_CAPACITY must be at least 1");
        }

        let command_marker = match lookup("TABLETALK_COMMAND_MARKER") {
            Some(raw) => {
                let mut chars = raw.trim().chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_whitespace() && !RESERVED_MARKERS.contains(&c) => c,
                    _ => bail!(
                        "TABLETALK_COMMAND_MARKER must be a single character other than '@', '-' or '?', got '{}'",
                        raw
                    ),
                }
            }
            None => defaults.command_marker,
        };

        let case_sensitive = match lookup("TABLETALK_CASE_SENSITIVE") {
            Some(raw) => parse_bool(&raw).context("TABLETALK_CASE_SENSITIVE must be a boolean")?,
            None => defaults.case_sensitive,
        };

        let max_suggestions = lookup("TABLETALK_MAX_SUGGESTIONS")
            .and_then(|raw| raw.trim().parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.max_suggestions);

        let context_path = lookup("TABLETALK_CONTEXT_PATH")
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            history_capacity,
            command_marker,
            case_sensitive,
            max_suggestions,
            context_path,
        })
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("'{}' is not a boolean", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = RunnerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RunnerConfig::default());
        assert_eq!(config.history_capacity, 100);
        assert_eq!(config.command_marker, '/');
    }

    #[test]
    fn reads_overrides() {
        let config = RunnerConfig::from_lookup(lookup(&[
            ("TABLETALK_HISTORY_CAPACITY", "25"),
            ("TABLETALK_COMMAND_MARKER", "!"),
            ("TABLETALK_CASE_SENSITIVE", "yes"),
            ("TABLETALK_MAX_SUGGESTIONS", "5"),
            ("TABLETALK_CONTEXT_PATH", "/tmp/context.json"),
        ]))
        .unwrap();

        assert_eq!(config.history_capacity, 25);
        assert_eq!(config.command_marker, '!');
        assert!(config.case_sensitive);
        assert_eq!(config.max_suggestions, 5);
        assert_eq!(config.context_path, Some(PathBuf::from("/tmp/context.json")));
    }

    #[test]
    fn rejects_bad_capacity() {
        assert!(RunnerConfig::from_lookup(lookup(&[("TABLETALK_HISTORY_CAPACITY", "lots")])).is_err());
        assert!(RunnerConfig::from_lookup(lookup(&[("TABLETALK_HISTORY_CAPACITY", "0")])).is_err());
    }

    #[test]
    fn rejects_reserved_markers() {
        assert!(RunnerConfig::from_lookup(lookup(&[("TABLETALK_COMMAND_MARKER", "@")])).is_err());
        assert!(RunnerConfig::from_lookup(lookup(&[("TABLETALK_COMMAND_MARKER", "//")])).is_err());
    }

    #[test]
    fn invalid_suggestion_cap_falls_back() {
        let config =
            RunnerConfig::from_lookup(lookup(&[("TABLETALK_MAX_SUGGESTIONS", "0")])).unwrap();
        assert_eq!(config.max_suggestions, DEFAULT_MAX_SUGGESTIONS);
    }
}
