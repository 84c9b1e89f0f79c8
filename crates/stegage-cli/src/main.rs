//! Stegage CLI - hide age-encrypted files inside images
//!
//! This is the command-line interface for stegage. It wires the core
//! pipeline to files, stdin/stdout and passphrase prompts.

mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod logging;
mod progress;

use clap::{CommandFactory, Parser};
use clap_complete::generate;

use crate::cli::{Cli, Commands};
use crate::commands::{capacity, decode, encode, CommandContext};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(&cli) {
        errors::exit_with(&e);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Encode(args) => encode::run(&context(cli)?, args),
        Commands::Decode(args) => decode::run(&context(cli)?, args),
        Commands::Capacity(args) => capacity::run(&context(cli)?, args),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "stegage", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn context(cli: &Cli) -> anyhow::Result<CommandContext> {
    let config = config::load_config(cli.config.as_deref())?;
    tracing::debug!(
        work_factor = config.cipher.work_factor,
        max_work_factor = config.cipher.max_work_factor,
        "resolved config"
    );
    Ok(CommandContext {
        config,
        quiet: cli.quiet,
    })
}
