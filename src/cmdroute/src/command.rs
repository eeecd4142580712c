//! Command structure and handler seam.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use thiserror::Error;

use crate::flags::FlagSet;
use crate::registry::CommandRegistry;
use crate::status::ExitStatus;

/// Logic behind a runnable command.
pub trait Handler: Send + Sync {
    /// Run the command. Errors are reported by the dispatcher and raise the
    /// exit status; return an [`ExitError`] to choose the code.
    fn run(&self, invocation: &mut Invocation<'_>) -> anyhow::Result<()>;
}

impl<F> Handler for F
where
    F: Fn(&mut Invocation<'_>) -> anyhow::Result<()> + Send + Sync,
{
    fn run(&self, invocation: &mut Invocation<'_>) -> anyhow::Result<()> {
        self(invocation)
    }
}

/// Hook that declares flags on a [`FlagSet`].
pub type FlagHook = Arc<dyn Fn(&mut FlagSet) + Send + Sync>;

/// Handler failure carrying an explicit exit code.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ExitError {
    /// Process exit code to report.
    pub code: i32,
    /// Message shown on the error stream.
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Everything a handler gets to see.
pub struct Invocation<'a> {
    command: &'a Command,
    path: &'a [&'a str],
    flags: &'a FlagSet,
    status: &'a ExitStatus,
    stdout: &'a mut dyn Write,
}

impl<'a> Invocation<'a> {
    pub(crate) fn new(
        command: &'a Command,
        path: &'a [&'a str],
        flags: &'a FlagSet,
        status: &'a ExitStatus,
        stdout: &'a mut dyn Write,
    ) -> Self {
        Self {
            command,
            path,
            flags,
            status,
            stdout,
        }
    }

    /// The matched command.
    pub fn command(&self) -> &Command {
        self.command
    }

    /// Canonical names from the root command down to the matched one.
    pub fn path(&self) -> &[&str] {
        self.path
    }

    /// Flags bound for this command, global flags included.
    pub fn flags(&self) -> &FlagSet {
        self.flags
    }

    /// Positional arguments left after flag parsing.
    pub fn args(&self) -> &[String] {
        self.flags.args()
    }

    /// Standard output for the handler's results.
    pub fn stdout(&mut self) -> &mut dyn Write {
        &mut *self.stdout
    }

    /// Raise the process exit status without failing the handler.
    pub fn raise_exit_status(&self, code: i32) {
        self.status.raise(code);
    }
}

/// One invocable action or a namespace of subcommands.
#[derive(Clone, Default)]
pub struct Command {
    /// Name, unique among siblings.
    pub name: String,

    /// Alternate names resolving to this command.
    pub aliases: Vec<String>,

    /// Usage line; the canonical path is shown when empty.
    pub usage_line: String,

    /// One-line description for command listings.
    pub short: String,

    /// Long description, expanded as a template in command help.
    pub long: String,

    handler: Option<Arc<dyn Handler>>,
    flag_hook: Option<FlagHook>,
    subcommands: CommandRegistry,
}

impl Command {
    /// Create a command with no handler, flags or subcommands.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Set the usage line.
    pub fn usage_line(mut self, usage_line: impl Into<String>) -> Self {
        self.usage_line = usage_line.into();
        self
    }

    /// Set the short description.
    pub fn short(mut self, short: impl Into<String>) -> Self {
        self.short = short.into();
        self
    }

    /// Set the long description.
    pub fn long(mut self, long: impl Into<String>) -> Self {
        self.long = long.into();
        self
    }

    /// Make the command runnable with a closure.
    pub fn run<F>(self, handler: F) -> Self
    where
        F: Fn(&mut Invocation<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handler(handler)
    }

    /// Make the command runnable with any [`Handler`].
    pub fn handler(mut self, handler: impl Handler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Register a hook declaring this command's own flags.
    pub fn flags<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut FlagSet) + Send + Sync + 'static,
    {
        self.flag_hook = Some(Arc::new(hook));
        self
    }

    /// Add a subcommand.
    pub fn subcommand(mut self, command: Command) -> Self {
        self.subcommands.register(command);
        self
    }

    /// Whether the command has a handler.
    pub fn is_runnable(&self) -> bool {
        self.handler.is_some()
    }

    /// Whether `name` is this command's name or one of its aliases.
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|alias| alias == name)
    }

    /// Name followed by aliases.
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Nested subcommand registry.
    pub fn subcommands(&self) -> &CommandRegistry {
        &self.subcommands
    }

    pub(crate) fn handler_ref(&self) -> Option<&dyn Handler> {
        self.handler.as_deref()
    }

    /// Apply this command's flag hook, if any.
    pub fn declare_flags(&self, flags: &mut FlagSet) {
        if let Some(hook) = &self.flag_hook {
            hook(flags);
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("usage_line", &self.usage_line)
            .field("short", &self.short)
            .field("runnable", &self.is_runnable())
            .field("has_flags", &self.flag_hook.is_some())
            .field("subcommands", &self.subcommands)
            .finish()
    }
}
