//! gpp - compile a C/C++ file and run it in a terminal

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("gpp=debug")
    } else {
        EnvFilter::new("gpp=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    // Execute command
    match cli.command {
        Commands::Build(args) => commands::build::execute(args, cli.no_color),
        Commands::Errors(args) => commands::errors::execute(args).map(|_| 0),
        Commands::Terminals(args) => commands::terminals::execute(args).map(|_| 0),
        Commands::Config(args) => commands::config::execute(args).map(|_| 0),
        Commands::Completions(args) => commands::completions::execute(args).map(|_| 0),
    }
}
