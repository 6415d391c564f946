//! # tollgate-cli
//!
//! Command-line harness for the Tollgate policy engine.
//!
//! - `tollgate evaluate` — evaluate an intent against a state file
//! - `tollgate verify` — check a previously issued authorization
//! - `tollgate audit verify/tail` — inspect a JSONL audit log

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Tollgate: deterministic spend authorization for agents.
#[derive(Parser)]
#[command(name = "tollgate", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an intent and print the decision as JSON.
    Evaluate(commands::evaluate::EvaluateArgs),
    /// Verify an authorization against its intent and the current state.
    Verify(commands::verify::VerifyArgs),
    /// Inspect the audit trail.
    Audit {
        #[command(subcommand)]
        command: commands::audit::AuditCommands,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the JSON result.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("tollgate_policy=info".parse()?)
                .add_directive("tollgate_cli=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Evaluate(args) => commands::evaluate::execute(args),
        Commands::Verify(args) => commands::verify::execute(args),
        Commands::Audit { command } => commands::audit::execute(command),
    }
}
