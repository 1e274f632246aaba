use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    inspect::{self, InspectArgs},
    verify::{self, VerifyArgs},
};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "spectrace", about = "Inspect and verify recorded spec traces")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a persisted trace directory.
    Inspect(InspectArgs),
    /// Check references, step order and artifact digests of a trace directory.
    Verify(VerifyArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Inspect(args) => inspect::run(&args),
        Command::Verify(args) => verify::run(&args),
    }
}
