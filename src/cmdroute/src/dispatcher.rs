//! Dispatch state machine.
//!
//! `[global flags] help [command]` prints usage. Anything else is resolved to
//! a command, whose flags are bound from the arguments left by resolution
//! before its handler runs. Every user-visible line, error lines included, is
//! written to the writers given to [`Dispatcher::dispatch`].

use std::io::{self, Write};
use std::sync::Arc;

use tracing::debug;

use crate::command::{Command, FlagHook, Invocation};
use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::flags::{FlagError, FlagSet};
use crate::registry::CommandRegistry;
use crate::resolver::resolve;
use crate::status::{ExitStatus, process_code};
use crate::template::TemplateError;
use crate::usage::UsageRenderer;

/// Reserved first argument that switches to help mode.
pub const HELP_COMMAND: &str = "help";

/// Routes arguments to registered commands.
pub struct Dispatcher {
    registry: CommandRegistry,
    config: DispatchConfig,
    global_flags: Option<FlagHook>,
    status: ExitStatus,
}

impl Dispatcher {
    /// Create a dispatcher over `registry` with the default configuration.
    pub fn new(registry: CommandRegistry) -> Self {
        Self {
            registry,
            config: DispatchConfig::default(),
            global_flags: None,
            status: ExitStatus::new(),
        }
    }

    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Register the hook that declares global flags.
    ///
    /// The hook runs on the program-level flag set and on every command's
    /// flag set.
    pub fn with_global_flags<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut FlagSet) + Send + Sync + 'static,
    {
        self.global_flags = Some(Arc::new(hook));
        self
    }

    /// Replace the program-level usage template.
    pub fn with_usage_template(mut self, text: &str) -> Result<Self, TemplateError> {
        self.config = self.config.with_usage_template(text)?;
        Ok(self)
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Accumulated exit status.
    pub fn status(&self) -> &ExitStatus {
        &self.status
    }

    /// Route `args` (without the program name) to a command.
    ///
    /// A successful return can still leave a raised exit status if the
    /// handler raised it; see [`Dispatcher::run`].
    pub fn dispatch(
        &self,
        args: &[String],
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<(), DispatchError> {
        let result = self.route(args, stdout, stderr);
        if let Err(err) = &result {
            if err.is_broken_pipe() {
                debug!("Output pipe closed");
            } else if matches!(err, DispatchError::Output(_) | DispatchError::Template(_)) {
                let _ = writeln!(stderr, "{err}");
            }
        }
        result
    }

    /// Dispatch and return the exit status.
    pub fn run(&self, args: &[String], stdout: &mut dyn Write, stderr: &mut dyn Write) -> i32 {
        if let Err(err) = self.dispatch(args, stdout, stderr) {
            self.status.raise(err.exit_code());
        }
        self.status.get()
    }

    /// Dispatch the process arguments and exit with the resulting status.
    pub fn execute(&self) -> ! {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut stdout = io::stdout().lock();
        let mut stderr = io::stderr().lock();
        let code = self.run(&args, &mut stdout, &mut stderr);
        let _ = stdout.flush();
        std::process::exit(i32::from(process_code(code)))
    }

    fn route(
        &self,
        args: &[String],
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<(), DispatchError> {
        let usage = UsageRenderer::new(&self.config, &self.registry);

        let mut globals = self.flag_set(usage.program_name(), None);
        match globals.parse(args) {
            Ok(()) => {}
            Err(FlagError::HelpRequested) => {
                usage.render_program(&globals, stdout)?;
                return Ok(());
            }
            Err(source) => {
                let err = DispatchError::Flags {
                    context: "cmd".to_string(),
                    source,
                };
                report(&err, stderr)?;
                usage.render_program(&globals, stderr)?;
                return Err(err);
            }
        }

        let positional = globals.args();
        let Some(first) = positional.first() else {
            usage.render_program(&globals, stderr)?;
            return Err(DispatchError::NoCommand);
        };
        if first == HELP_COMMAND {
            return self.help(&usage, &globals, &positional[1..], stdout, stderr);
        }

        let context = format!("cmd({first})");
        let resolution = match resolve(&self.registry, positional) {
            Ok(resolution) => resolution,
            Err(source) => {
                let err = DispatchError::NotFound { context, source };
                report(&err, stderr)?;
                return Err(err);
            }
        };
        let command = resolution.command;
        let path = resolution.path.join(" ");
        debug!(
            "Resolved '{}' with {} remaining arg(s)",
            path,
            resolution.remaining.len()
        );

        let mut flags = self.flag_set(&command.name, Some(command));
        match flags.parse(resolution.remaining) {
            Ok(()) => flags.inherit_from(&globals),
            Err(FlagError::HelpRequested) => {
                usage.render_command(command, &resolution.path, &flags, stdout)?;
                return Ok(());
            }
            Err(source) => {
                let err = DispatchError::Flags { context, source };
                report(&err, stderr)?;
                usage.render_command(command, &resolution.path, &flags, stderr)?;
                return Err(err);
            }
        }

        let Some(handler) = command.handler_ref() else {
            let err = DispatchError::NotRunnable { context, path };
            report(&err, stderr)?;
            usage.render_command(command, &resolution.path, &flags, stderr)?;
            return Err(err);
        };

        debug!("Running '{}' with args {:?}", path, flags.args());
        let mut invocation =
            Invocation::new(command, &resolution.path, &flags, &self.status, &mut *stdout);
        if let Err(error) = handler.run(&mut invocation) {
            let broken_pipe = error
                .downcast_ref::<io::Error>()
                .is_some_and(|err| err.kind() == io::ErrorKind::BrokenPipe);
            if broken_pipe {
                return Err(io::Error::from(io::ErrorKind::BrokenPipe).into());
            }
            let err = DispatchError::Handler { context, error };
            report(&err, stderr)?;
            return Err(err);
        }
        stdout.flush()?;
        Ok(())
    }

    fn help(
        &self,
        usage: &UsageRenderer<'_>,
        globals: &FlagSet,
        targets: &[String],
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<(), DispatchError> {
        match targets {
            [] => {
                usage.render_program(globals, stdout)?;
                Ok(())
            }
            [name] => match resolve(&self.registry, targets) {
                Ok(resolution) => {
                    let flags = self.flag_set(&resolution.command.name, Some(resolution.command));
                    usage.render_command(resolution.command, &resolution.path, &flags, stdout)?;
                    Ok(())
                }
                Err(source) => {
                    let err = DispatchError::NotFound {
                        context: format!("help({name})"),
                        source,
                    };
                    report(&err, stderr)?;
                    Err(err)
                }
            },
            _ => {
                let err = DispatchError::TooManyArguments;
                report(&err, stderr)?;
                Err(err)
            }
        }
    }

    /// Fresh flag set with the global flags and, for a command, its own.
    fn flag_set(&self, name: &str, command: Option<&Command>) -> FlagSet {
        let mut flags = FlagSet::new(name);
        if let Some(hook) = &self.global_flags {
            hook(&mut flags);
        }
        if let Some(command) = command {
            command.declare_flags(&mut flags);
        }
        flags
    }
}

fn report(err: &DispatchError, stderr: &mut dyn Write) -> Result<(), DispatchError> {
    writeln!(stderr, "{err}")?;
    stderr.flush()?;
    Ok(())
}
