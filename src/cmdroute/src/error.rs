//! Dispatch errors.

use std::io;

use thiserror::Error;

use crate::command::ExitError;
use crate::flags::FlagError;
use crate::resolver::ResolveError;
use crate::status::{FAILURE, SUCCESS, USAGE_ERROR};
use crate::template::TemplateError;
use crate::usage::UsageError;

/// Why a dispatch did not succeed.
///
/// The `Display` form of each variant is the line shown on the error stream.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No command given after the global flags.
    #[error("no command provided")]
    NoCommand,

    /// Command lookup failed.
    #[error("{context}: {source}")]
    NotFound {
        context: String,
        #[source]
        source: ResolveError,
    },

    /// Global or command flags did not parse.
    #[error("{context}: {source}")]
    Flags {
        context: String,
        #[source]
        source: FlagError,
    },

    /// `help` was given more than one command.
    #[error("help: too many arguments")]
    TooManyArguments,

    /// The resolved command has no handler.
    #[error("{context}: not runnable, {path:?} requires a subcommand")]
    NotRunnable { context: String, path: String },

    /// The handler returned an error.
    #[error("{context}: {error:#}")]
    Handler {
        context: String,
        error: anyhow::Error,
    },

    /// A usage template failed to render.
    #[error("rendering usage: {0}")]
    Template(#[from] TemplateError),

    /// Writing to an output stream failed.
    #[error("writing output: {0}")]
    Output(#[from] io::Error),
}

impl From<UsageError> for DispatchError {
    fn from(err: UsageError) -> Self {
        match err {
            UsageError::Template(err) => Self::Template(err),
            UsageError::Io(err) => Self::Output(err),
        }
    }
}

impl DispatchError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoCommand
            | Self::NotFound { .. }
            | Self::Flags { .. }
            | Self::TooManyArguments
            | Self::NotRunnable { .. } => USAGE_ERROR,
            Self::Handler { error, .. } => error
                .downcast_ref::<ExitError>()
                .map(|exit| exit.code)
                .filter(|code| *code > SUCCESS)
                .unwrap_or(FAILURE),
            Self::Template(_) | Self::Output(_) => FAILURE,
        }
    }

    /// Whether the error is a closed output pipe.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, Self::Output(err) if err.kind() == io::ErrorKind::BrokenPipe)
    }
}
