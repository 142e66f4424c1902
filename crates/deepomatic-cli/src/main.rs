//! Deepomatic CLI - tasks and inference from the command line
//!
//! This is the main entry point for the `deepomatic` command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let client = commands::client(&cli.connection)?;
    match cli.command {
        Commands::Task(command) => commands::task::run(command, &client, cli.quiet),
        Commands::Infer(args) => commands::infer::run(args, &client, cli.quiet),
    }
}

/// Initialize tracing with appropriate verbosity
///
/// `RUST_LOG` takes precedence over the flags when set.
fn init_tracing(verbose: u8, quiet: bool) {
    let default = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
