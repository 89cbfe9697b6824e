//! # freed CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use freed_cli::disclosure::{run_disclosure, DisclosureArgs};
use freed_cli::dispute::{run_dispute, DisputeArgs};
use freed_cli::ledger::{run_ledger, LedgerArgs};

/// Freed ID governance-integrity verifier.
///
/// Verifies audit ledgers, disclosure presentations and dispute case
/// histories.
#[derive(Parser, Debug)]
#[command(name = "freed", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Audit ledger operations (verify, append, show).
    Ledger(LedgerArgs),

    /// Minimum-disclosure presentations (build, validate, vectors).
    Disclosure(DisclosureArgs),

    /// Dispute case verification.
    Dispute(DisputeArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let result = match &cli.command {
        Commands::Ledger(args) => run_ledger(args),
        Commands::Disclosure(args) => run_disclosure(args),
        Commands::Dispute(args) => run_dispute(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// `RUST_LOG` wins when set; otherwise verbosity picks the level.
fn init_tracing(verbose: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
