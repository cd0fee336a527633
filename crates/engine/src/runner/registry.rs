//! Name-keyed command registry with alias resolution.

use std::collections::HashMap;
use std::sync::Arc;

use crate::commands::CommandDefinition;

/// Registry of available commands.
///
/// Canonical names and aliases live in separate maps; a lookup tries the
/// name first, then the alias. Keys are lowercased unless the registry is
/// case-sensitive.
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn CommandDefinition>>,
    aliases: HashMap<String, String>,
    case_sensitive: bool,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::empty(false)
    }
}

impl CommandRegistry {
    /// Create a registry without any commands.
    pub fn empty(case_sensitive: bool) -> Self {
        Self {
            commands: HashMap::new(),
            aliases: HashMap::new(),
            case_sensitive,
        }
    }

    /// Create a registry seeded with `commands`.
    pub fn with_commands<I>(commands: I, case_sensitive: bool) -> Self
    where
        I: IntoIterator<Item = Arc<dyn CommandDefinition>>,
    {
        let mut registry = Self::empty(case_sensitive);
        for command in commands {
            registry.register(command);
        }
        registry
    }

    fn key(&self, name: &str) -> String {
        let name = name.trim();
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }

    /// Register a command, replacing any earlier command of the same name
    /// together with all of its aliases. Returns the replaced command.
    pub fn register(
        &mut self,
        command: Arc<dyn CommandDefinition>,
    ) -> Option<Arc<dyn CommandDefinition>> {
        let meta = command.metadata();
        let name = self.key(&meta.name);

        let previous = self.remove(&name);
        if previous.is_some() {
            tracing::debug!(command = %name, "Replacing registered command");
        }

        for alias in &meta.aliases {
            let alias = self.key(alias);
            if alias == name {
                continue;
            }
            if let Some(owner) = self.aliases.insert(alias.clone(), name.clone()) {
                tracing::warn!(alias = %alias, from = %owner, to = %name, "Alias reassigned");
            }
        }
        self.commands.insert(name, command);
        previous
    }

    /// Remove a command (by name or alias) and every alias pointing at it.
    pub fn unregister(&mut self, name_or_alias: &str) -> Option<Arc<dyn CommandDefinition>> {
        let key = self.key(name_or_alias);
        let name = if self.commands.contains_key(&key) {
            key
        } else {
            self.aliases.get(&key)?.clone()
        };
        self.remove(&name)
    }

    fn remove(&mut self, name: &str) -> Option<Arc<dyn CommandDefinition>> {
        let removed = self.commands.remove(name)?;
        self.aliases.retain(|_, target| target != name);
        Some(removed)
    }

    /// Look up by canonical name or alias.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn CommandDefinition>> {
        self.resolve(name, true)
    }

    /// Look up by canonical name, and by alias when `expand_aliases` is set.
    pub fn resolve(&self, name: &str, expand_aliases: bool) -> Option<&Arc<dyn CommandDefinition>> {
        let key = self.key(name);
        if let Some(command) = self.commands.get(&key) {
            return Some(command);
        }
        if !expand_aliases {
            return None;
        }
        self.aliases
            .get(&key)
            .and_then(|target| self.commands.get(target))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Canonical names, unordered.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Canonical names followed by aliases, unordered.
    pub fn lookup_keys(&self) -> impl Iterator<Item = &str> {
        self.names().chain(self.aliases.keys().map(String::as_str))
    }

    /// Canonical name an alias (or name) resolves to.
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        self.get(name).map(|command| command.metadata().name.as_str())
    }

    pub fn commands(&self) -> impl Iterator<Item = &Arc<dyn CommandDefinition>> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
