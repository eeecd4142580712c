//! Subcommand dispatch for command-line programs.
//!
//! This crate routes process arguments to registered commands, binds typed
//! flags and renders usage text.
//!
//! # Resolution
//!
//! Commands nest. Given `app remote add origin`, the dispatcher looks up
//! `remote` at the top level, then `add` among its subcommands, and hands
//! `origin` to the handler as a positional argument. When a subcommand
//! lookup fails the parent matches instead, with the unmatched token left as
//! an argument.
//!
//! # Invocation
//!
//! ```text
//! <program> [global flags] <command> [subcommand ...] [command flags] [args]
//! <program> help [command]
//! ```
//!
//! `-h`/`--help` print usage wherever flags are parsed.
//!
//! # Exit status
//!
//! - `0` - success
//! - `1` - handler or output failure
//! - `2` - usage error: unknown command, bad flags, malformed `help`
//!
//! Handlers can pick another code by returning an [`ExitError`]. The status
//! only ever increases.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::io::Write;
//!
//! use cmdroute::{Command, CommandRegistry, Dispatcher};
//!
//! let registry: CommandRegistry = vec![
//!     Command::new("version")
//!         .short("Print the version")
//!         .run(|inv| {
//!             writeln!(inv.stdout(), "v0.0.1")?;
//!             Ok(())
//!         }),
//! ]
//! .into_iter()
//! .collect();
//!
//! Dispatcher::new(registry).execute();
//! ```

mod command;
mod config;
mod dispatcher;
mod error;
pub mod flags;
mod registry;
pub mod resolver;
pub mod status;
pub mod template;
pub mod usage;

pub use command::{Command, ExitError, FlagHook, Handler, Invocation};
pub use config::{DEFAULT_PROGRAM_NAME, DEFAULT_SHORT, DispatchConfig};
pub use dispatcher::{Dispatcher, HELP_COMMAND};
pub use error::DispatchError;
pub use flags::{Flag, FlagError, FlagKind, FlagSet, FlagValue};
pub use registry::CommandRegistry;
pub use resolver::{Resolution, ResolveError, resolve};
pub use status::ExitStatus;
pub use template::{Template, TemplateData, TemplateError};
pub use usage::{DEFAULT_USAGE_TEMPLATE, UsageError, UsageRenderer};
