//! Argument model: targets, flags and plain text.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::tokenize::Token;

/// Prefix marking a target token (`@Bob`).
pub const TARGET_MARKER: char = '@';

/// Prefix marking a flag token (`--whisper`, `--level=3`).
pub const FLAG_PREFIX: &str = "--";

/// Value carried by a flag.
///
/// A bare `--flag` is a [`FlagValue::Switch`], which reads as the string
/// `"true"` so string-typed consumers keep working.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Switch,
    Value(String),
}

impl FlagValue {
    pub fn as_str(&self) -> &str {
        match self {
            FlagValue::Switch => "true",
            FlagValue::Value(v) => v,
        }
    }

    pub fn is_switch(&self) -> bool {
        matches!(self, FlagValue::Switch)
    }

    /// Boolean reading of the flag; `None` when the value is not boolean-like.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Switch => Some(true),
            FlagValue::Value(v) => match v.trim().to_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
        }
    }

    pub fn parse<T: FromStr>(&self) -> Result<T, T::Err> {
        self.as_str().trim().parse()
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FlagValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Insertion-ordered flag map; re-setting a name keeps its slot and takes the new value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Flags(Vec<(String, FlagValue)>);

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FlagValue) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FlagValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlagValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Flags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Tokens of one command invocation, partitioned by role.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandArgs {
    /// Every token, in input order
    pub raw: Vec<String>,
    /// Target identifiers with the marker stripped, in input order
    pub targets: Vec<String>,
    pub flags: Flags,
    /// Tokens that are neither targets nor flags, in input order
    pub plain_text: Vec<String>,
}

impl CommandArgs {
    pub(crate) fn from_tokens(tokens: Vec<Token>) -> Self {
        let mut args = Self::default();

        for token in tokens {
            if !token.literal {
                if let Some(target) = token.text.strip_prefix(TARGET_MARKER) {
                    args.targets.push(target.to_string());
                    args.raw.push(token.text);
                    continue;
                }
                if let Some(flag) = token.text.strip_prefix(FLAG_PREFIX) {
                    let (name, value) = match flag.split_once('=') {
                        Some((name, value)) => (name, FlagValue::Value(value.to_string())),
                        None => (flag, FlagValue::Switch),
                    };
                    args.flags.insert(name, value);
                    args.raw.push(token.text);
                    continue;
                }
            }
            args.plain_text.push(token.text.clone());
            args.raw.push(token.text);
        }

        args
    }

    /// Build arguments from a whitespace-free word list (tests, programmatic callers).
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_tokens(
            words
                .into_iter()
                .map(|w| Token {
                    text: w.into(),
                    literal: false,
                })
                .collect(),
        )
    }

    /// Plain text joined with single spaces.
    pub fn text(&self) -> String {
        self.plain_text.join(" ")
    }

    pub fn first_target(&self) -> Option<&str> {
        self.targets.first().map(String::as_str)
    }

    pub fn flag(&self, name: &str) -> Option<&FlagValue> {
        self.flags.get(name)
    }

    /// True when the flag is present and not explicitly false.
    pub fn is_set(&self, name: &str) -> bool {
        self.flags
            .get(name)
            .map(|v| v.as_bool().unwrap_or(true))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}
