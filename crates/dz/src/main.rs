//! dz CLI - live reload for documentation sites.
//!
//! Provides commands for:
//! - `listen`: Follow a docs server's event stream and run a command on
//!   every rebuild
//! - `attributes`: Print the `<html>` attributes that configure the page
//!   components

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{AttributesArgs, ListenArgs};
use output::Output;

/// dz - documentation site page components.
#[derive(Parser)]
#[command(name = "dz", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for rebuild events from a docs server.
    Listen(ListenArgs),
    /// Print the root element attributes for the configured page.
    Attributes(AttributesArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Listen(args) if args.verbose);

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Listen(args) => args.execute(),
        Commands::Attributes(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
