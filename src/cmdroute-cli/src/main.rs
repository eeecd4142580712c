//! cmdroute-demo - a small git-flavoured program built on cmdroute.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, bail};
use cmdroute::{Command, CommandRegistry, DispatchConfig, Dispatcher, ExitError, Invocation};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const VERSION: &str = "v0.0.1";

const REMOTE_LONG: &str = concat!(
    "Add and remove the remotes known to {{.Name}}.\n",
    "\n",
    "Run \"{{.Name}} help {{.Command}}\" to see this again.",
);

fn setup_logging() {
    let filter = std::env::var("CMDROUTE_LOG")
        .ok()
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    let subscriber = tracing_subscriber::registry().with(filter);
    let json = std::env::var("CMDROUTE_LOG_FORMAT").is_ok_and(|format| format == "json");
    if json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn verbose(inv: &Invocation<'_>) -> bool {
    inv.flags().get_bool("verbose") || inv.flags().get_bool("v")
}

fn version(inv: &mut Invocation<'_>) -> anyhow::Result<()> {
    writeln!(inv.stdout(), "{VERSION}")?;
    if verbose(inv) {
        writeln!(inv.stdout(), "cmdroute {}", env!("CARGO_PKG_VERSION"))?;
    }
    Ok(())
}

fn remote_add(inv: &mut Invocation<'_>) -> anyhow::Result<()> {
    let [name] = inv.args() else {
        bail!("expected exactly one remote name, got {}", inv.args().len());
    };
    let name = name.clone();
    let fetch = inv.flags().get_bool("fetch") || inv.flags().get_bool("f");

    writeln!(inv.stdout(), "added remote {name}")?;
    if fetch {
        writeln!(inv.stdout(), "fetching {name}")?;
    }
    Ok(())
}

fn remote_remove(inv: &mut Invocation<'_>) -> anyhow::Result<()> {
    if inv.args().is_empty() {
        return Err(ExitError::new(cmdroute::status::USAGE_ERROR, "no remote names given").into());
    }
    let names = inv.args().to_vec();
    for name in &names {
        if verbose(inv) {
            debug!("Removing remote '{}'", name);
        }
        writeln!(inv.stdout(), "removed remote {name}")?;
    }
    Ok(())
}

fn echo(inv: &mut Invocation<'_>) -> anyhow::Result<()> {
    let count = inv.flags().get_int("n").unwrap_or(1);
    let count = usize::try_from(count).with_context(|| format!("invalid repeat count {count}"))?;
    let mut line = inv.args().join(" ");
    if inv.flags().get_bool("upper") {
        line = line.to_uppercase();
    }
    for _ in 0..count {
        writeln!(inv.stdout(), "{line}")?;
    }
    Ok(())
}

fn commands() -> CommandRegistry {
    vec![
        Command::new("version")
            .short("Print the version")
            .run(version),
        Command::new("remote")
            .short("Manage tracked remotes")
            .long(REMOTE_LONG)
            .subcommand(
                Command::new("add")
                    .usage_line("remote add [-f] <name>")
                    .short("Add a remote")
                    .flags(|f| {
                        f.bool("fetch", false, "fetch the remote after adding it")
                            .bool("f", false, "shorthand for --fetch");
                    })
                    .run(remote_add),
            )
            .subcommand(
                Command::new("remove")
                    .alias("rm")
                    .usage_line("remote remove <name>...")
                    .short("Remove remotes")
                    .run(remote_remove),
            ),
        Command::new("echo")
            .usage_line("echo [--upper] [-n count] <words>...")
            .short("Print the arguments")
            .long("{{ .Short | trim }}, optionally uppercased and repeated.")
            .flags(|f| {
                f.bool("upper", false, "uppercase the output")
                    .int("n", 1, "number of times to print");
            })
            .run(echo),
    ]
    .into_iter()
    .collect()
}

fn main() -> ExitCode {
    setup_logging();

    let dispatcher = Dispatcher::new(commands())
        .with_config(DispatchConfig::new().with_short("Demonstrates nested command dispatch"))
        .with_global_flags(|f| {
            f.bool("verbose", false, "make the operation more talkative")
                .bool("v", false, "shorthand for --verbose");
        });

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    let code = dispatcher.run(&args, &mut stdout, &mut stderr);
    let _ = stdout.flush();
    debug!("Exiting with status {}", code);

    ExitCode::from(cmdroute::status::process_code(code))
}
