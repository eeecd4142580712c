//! Command path resolution.
//!
//! Resolution is greedy with fallback: `app foo bar` resolves to subcommand
//! `bar` of `foo` when it exists, otherwise to `foo` with `bar` left as a
//! positional argument. Once the first token matches, resolution never fails;
//! a subcommand lookup failure is swallowed rather than reported.

use thiserror::Error;
use tracing::debug;

use crate::command::Command;
use crate::registry::CommandRegistry;

/// Lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No arguments to resolve.
    #[error("not found, no command provided")]
    NoCommand,

    /// The first argument matches no command name or alias.
    #[error("not found, unknown command {0:?}")]
    Unknown(String),
}

/// A resolved command path.
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    /// The deepest matched command.
    pub command: &'a Command,
    /// Canonical names from the root command down to `command`.
    pub path: Vec<&'a str>,
    /// Arguments not consumed by resolution.
    pub remaining: &'a [String],
}

/// Find the deepest command matching a prefix of `args`.
pub fn resolve<'a>(
    registry: &'a CommandRegistry,
    args: &'a [String],
) -> Result<Resolution<'a>, ResolveError> {
    let (first, rest) = args.split_first().ok_or(ResolveError::NoCommand)?;
    let command = registry
        .search(first)
        .ok_or_else(|| ResolveError::Unknown(first.clone()))?;

    if !rest.is_empty() && !command.subcommands().is_empty() {
        match resolve(command.subcommands(), rest) {
            Ok(mut deeper) => {
                deeper.path.insert(0, command.name.as_str());
                return Ok(deeper);
            }
            Err(err) => {
                debug!(
                    "No subcommand of '{}' matches ({}), treating {:?} as arguments",
                    command.name, err, rest
                );
            }
        }
    }

    Ok(Resolution {
        command,
        path: vec![command.name.as_str()],
        remaining: rest,
    })
}
