//! Usage and help rendering.
//!
//! Program-level usage expands the configured template. Command-level usage
//! is assembled from blocks separated by blank lines; empty blocks are left
//! out entirely.

use std::io::{self, Write};

use thiserror::Error;

use crate::command::Command;
use crate::config::DispatchConfig;
use crate::flags::FlagSet;
use crate::registry::CommandRegistry;
use crate::template::{Template, TemplateData, TemplateError};

/// Default program-level usage template.
pub const DEFAULT_USAGE_TEMPLATE: &str = r#"{{.Name}} - {{.Short}}

Usage:

  {{.Name}} [flags] <command> [subcommand] [args]
{{.Commands}}{{.Flags}}
Use "{{.Name}} help <command>" or "{{.Name}} <command> --help" for more information about a command.
"#;

/// Fields available to the program-level template.
pub const PROGRAM_FIELDS: &[&str] = &["Name", "Short", "Commands", "Flags"];

/// Errors produced while rendering usage.
#[derive(Debug, Error)]
pub enum UsageError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Renders program and command usage for one registry.
#[derive(Debug)]
pub struct UsageRenderer<'a> {
    program_name: String,
    short: &'a str,
    template: &'a Template,
    registry: &'a CommandRegistry,
}

impl<'a> UsageRenderer<'a> {
    /// Create a renderer. The program name is resolved now.
    pub fn new(config: &'a DispatchConfig, registry: &'a CommandRegistry) -> Self {
        Self {
            program_name: config.program_name(),
            short: config.short(),
            template: config.usage_template(),
            registry,
        }
    }

    /// Program name substituted for `{{.Name}}`.
    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    /// Render program-level usage listing runnable top-level commands and
    /// the global flags.
    pub fn render_program(&self, globals: &FlagSet, out: &mut dyn Write) -> Result<(), UsageError> {
        let data = ProgramData {
            name: &self.program_name,
            short: self.short,
            commands: section("Available Commands:", &command_rows(self.registry)),
            flags: section("Flags:", &flag_rows(globals)),
        };
        let text = self.template.render(&data)?;
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    /// Render usage for `command`, reached through `path`, with its bound
    /// flag set.
    pub fn render_command(
        &self,
        command: &Command,
        path: &[&str],
        flags: &FlagSet,
        out: &mut dyn Write,
    ) -> Result<(), UsageError> {
        let path = path.join(" ");
        let usage_line = if command.usage_line.is_empty() {
            path.clone()
        } else {
            command.usage_line.clone()
        };

        let mut blocks = Vec::new();
        if command.short.is_empty() {
            blocks.push(path.clone());
        } else {
            blocks.push(format!("{} - {}", path, command.short));
        }
        blocks.push(format!("usage: {usage_line}"));

        if !command.aliases.is_empty() {
            blocks.push(format!("Aliases: {}", command.aliases.join(", ")));
        }

        if !command.long.trim().is_empty() {
            let data = CommandData {
                program: &self.program_name,
                command,
                path: &path,
                usage_line: &usage_line,
            };
            let long = Template::parse(&command.long)?.render(&data)?;
            let long = long.trim_end();
            if !long.is_empty() {
                blocks.push(long.to_string());
            }
        }

        let subcommands = command_rows(command.subcommands());
        if !subcommands.is_empty() {
            blocks.push(format!("Subcommands:\n{}", subcommands.join("\n")));
        }

        let flag_lines = flag_rows(flags);
        if !flag_lines.is_empty() {
            blocks.push(format!("Flags:\n{}", flag_lines.join("\n")));
        }

        writeln!(out, "{}", blocks.join("\n\n"))?;
        out.flush()?;
        Ok(())
    }
}

/// Aligned `name  short` rows for runnable commands.
fn command_rows(registry: &CommandRegistry) -> Vec<String> {
    let width = registry
        .runnable()
        .map(|cmd| cmd.name.chars().count())
        .max()
        .unwrap_or(0)
        + 2;
    registry
        .runnable()
        .map(|cmd| {
            format!("  {:<width$} {}", cmd.name, cmd.short)
                .trim_end()
                .to_string()
        })
        .collect()
}

/// Aligned flag rows; short names get one dash, long names two.
fn flag_rows(flags: &FlagSet) -> Vec<String> {
    let longest = flags
        .flags()
        .map(|flag| flag.name.chars().count())
        .max()
        .unwrap_or(0);
    let mut rows = Vec::with_capacity(flags.len());
    flags.visit_all(|flag| {
        let row = if flag.is_short() {
            format!("  -{:<width$} {}", flag.name, flag.usage, width = longest + 3)
        } else {
            format!("  --{:<width$} {}", flag.name, flag.usage, width = longest + 2)
        };
        rows.push(row.trim_end().to_string());
    });
    rows
}

/// A titled section with a leading blank line, or nothing.
fn section(title: &str, rows: &[String]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    let mut out = format!("\n{title}\n");
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }
    out
}

struct ProgramData<'a> {
    name: &'a str,
    short: &'a str,
    commands: String,
    flags: String,
}

impl TemplateData for ProgramData<'_> {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "Name" => Some(self.name.to_string()),
            "Short" => Some(self.short.to_string()),
            "Commands" => Some(self.commands.clone()),
            "Flags" => Some(self.flags.clone()),
            _ => None,
        }
    }
}

struct CommandData<'a> {
    program: &'a str,
    command: &'a Command,
    path: &'a str,
    usage_line: &'a str,
}

impl TemplateData for CommandData<'_> {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "Name" => Some(self.program.to_string()),
            "Command" => Some(self.command.name.clone()),
            "Path" => Some(self.path.to_string()),
            "Short" => Some(self.command.short.clone()),
            "UsageLine" => Some(self.usage_line.to_string()),
            "Aliases" => Some(self.command.aliases.join(", ")),
            _ => None,
        }
    }
}
