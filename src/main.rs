// Entry point of `ninja-master`: parses the command line, builds the
// invocation context and dispatches to the subcommand.

mod cli;
mod commands;
mod error;
mod installers;
mod libs;
mod logger;
mod schemas;

use crate::cli::cmd_enums::{Cli, Commands};
use crate::error::Error;
use crate::libs::context::AppContext;
use crate::libs::paths::resolve_data_dir;
use anyhow::Context;
use clap::Parser;
use colored::Colorize;

fn main() {
    let cli = Cli::parse();
    logger::init(cli.debug);

    let code = match dispatch(cli) {
        Ok(()) => 0,
        Err(err) => {
            log_error!("{:#}", err);
            exit_code(&err)
        }
    };
    std::process::exit(code);
}

fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let data_dir = resolve_data_dir(cli.data_dir.as_deref())?;
    let ctx = AppContext::new(&data_dir)
        .with_context(|| format!("failed to open data directory {}", data_dir.display()))?;

    match cli.command {
        Commands::Info => commands::info::run(&ctx),
        Commands::Fetch { tool } => commands::fetch::run(&ctx, tool),
        Commands::Install { tool, version } => commands::install::run(&ctx, tool, version),
        Commands::Remove { tool, silent } => commands::remove::run(&ctx, tool, silent),
        Commands::Versions { tool } => commands::versions::run(&ctx, tool),
        Commands::Toolchains => commands::toolchains::list(&ctx),
        Commands::SelectToolchain { id } => commands::toolchains::select(&ctx, id),
        Commands::Env => commands::env::run(&ctx),
        Commands::Run { command } => commands::run::run(&ctx, &command),
        Commands::Build { args } => commands::run::build(&ctx, &args),
        Commands::Configure { args } => commands::run::configure(&ctx, &args),
        Commands::Version => {
            commands::version::run(&ctx);
            Ok(())
        }
    }
}

/// A failed child command hands its exit code through; everything else is 1.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<Error>())
        .map(Error::exit_code)
        .unwrap_or(1)
}
