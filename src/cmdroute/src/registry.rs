//! Command registry.

use crate::command::Command;

/// Ordered collection of sibling commands.
///
/// Registration order is display order. Lookup is linear and returns the
/// first command whose name or alias matches, so sibling names are expected
/// to be unique.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Append a command.
    pub fn register(&mut self, command: Command) {
        if self.contains(&command.name) {
            tracing::warn!(
                "Command '{}' registered twice; the first registration wins",
                command.name
            );
        }
        self.commands.push(command);
    }

    /// Find the first command matching `name` by name or alias.
    pub fn search(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|cmd| cmd.matches(name))
    }

    /// Check if a command exists by name or alias.
    pub fn contains(&self, name: &str) -> bool {
        self.search(name).is_some()
    }

    /// Commands that have a handler, in registration order.
    pub fn runnable(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().filter(|cmd| cmd.is_runnable())
    }

    /// Get all command names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|cmd| cmd.name.as_str()).collect()
    }

    /// Get the number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Create an iterator over all commands.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }
}

impl Extend<Command> for CommandRegistry {
    fn extend<I: IntoIterator<Item = Command>>(&mut self, iter: I) {
        for cmd in iter {
            self.register(cmd);
        }
    }
}

impl FromIterator<Command> for CommandRegistry {
    fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
        let mut registry = Self::new();
        registry.extend(iter);
        registry
    }
}

impl<'a> IntoIterator for &'a CommandRegistry {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}
