//! # strata-cli
//!
//! Command-line front end for the Strata state-transition engine.
//!
//! ## Usage
//!
//! ```bash
//! # State root of a genesis allocation
//! strata state-root --alloc alloc.json
//!
//! # Apply hex-encoded RLP blocks on top of an allocation
//! strata apply --alloc alloc.json --blocks blocks.txt --chain chain.json
//! strata apply --alloc alloc.json --blocks blocks.txt --fork london --dump-state post.json
//!
//! # Rules in force at a block
//! strata fork 12965000
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod error;
mod output;

pub use error::CliError;

/// Strata CLI
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// CLI commands
#[derive(Debug, Subcommand)]
enum Commands {
    /// Compute the state root of a genesis allocation
    StateRoot(commands::state_root::StateRootArgs),
    /// Apply blocks to a genesis allocation
    Apply(commands::apply::ApplyArgs),
    /// Show the fork rules in force at a block
    Fork(commands::fork::ForkArgs),
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let json = cli.json;
    if let Err(e) = run(cli) {
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "error": format!("{:#}", e),
                    "success": false
                })
            );
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::StateRoot(args) => args.execute(cli.json)?,
        Commands::Apply(args) => args.execute(cli.json)?,
        Commands::Fork(args) => args.execute(cli.json)?,
    }
    Ok(())
}
