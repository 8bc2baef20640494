//! negalog-cli -- Command-line interface for the NegaLog missing-log detector
//!
//! Provides commands to analyze logs against declarative rules, validate
//! configuration, auto-detect timestamp formats, and diagnose common setup
//! problems. Unknown subcommands are dispatched to external plugin binaries
//! named `negalog-<command>`.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod error;
mod plugins;

use cli::{Cli, Commands};
use error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Compact subscriber for interactive use; logs go to stderr so that
    // report output on stdout stays machine-readable
    let log_level = cli.log_level.as_deref().unwrap_or("warn");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    };
    std::process::exit(exit_code);
}

/// Dispatch the parsed command. Returns the process exit code.
async fn run(cli: Cli) -> Result<i32, CliError> {
    match cli.command {
        Commands::Analyze(args) => commands::analyze::execute(args).await,
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Detect(args) => commands::detect::execute(args),
        Commands::Diagnose(args) => commands::diagnose::execute(args),
        Commands::Version => commands::version::execute(),
        Commands::External(args) => Ok(run_plugin(&args)),
    }
}

/// Resolve and run an external plugin for an unknown subcommand.
fn run_plugin(args: &[String]) -> i32 {
    let Some(command) = args.first() else {
        eprintln!("Error: missing command");
        return 2;
    };

    match plugins::find_plugin(command) {
        Some(path) => plugins::execute(&path, &args[1..]),
        None => {
            eprintln!("{}", plugins::not_found_message(command));
            2
        }
    }
}
