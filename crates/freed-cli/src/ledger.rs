//! # Ledger Subcommand
//!
//! - `verify` — replay the hash chain of a JSON Lines ledger.
//! - `append` — append one governance action.
//! - `show` — print every record exactly as stored, one per line.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde_json::Value;

use freed_ledger::{AuditLedger, JsonlFileStore, LedgerConfig};

use crate::report::CheckReport;

/// Arguments for the `freed ledger` subcommand.
#[derive(Args, Debug)]
pub struct LedgerArgs {
    /// Ledger operation to run.
    #[command(subcommand)]
    pub command: LedgerCommand,
}

/// `freed ledger` operations.
#[derive(Subcommand, Debug)]
pub enum LedgerCommand {
    /// Verify the hash chain; exit 1 on the first broken entry.
    Verify {
        /// Path to the JSON Lines ledger.
        path: PathBuf,
    },

    /// Append one action to the ledger, creating it if needed.
    Append {
        /// Path to the JSON Lines ledger.
        path: PathBuf,
        /// Action name, e.g. `register`.
        #[arg(long)]
        action: String,
        /// DID the action concerns.
        #[arg(long)]
        did: String,
        /// Details as a JSON object.
        #[arg(long, default_value = "{}")]
        details: String,
        /// Skip `fsync` after the write.
        #[arg(long)]
        no_fsync: bool,
    },

    /// Print every stored record, unchanged.
    Show {
        /// Path to the JSON Lines ledger.
        path: PathBuf,
    },
}

/// Execute the ledger subcommand.
pub fn run_ledger(args: &LedgerArgs) -> Result<u8> {
    match &args.command {
        LedgerCommand::Verify { path } => verify_ledger(path).emit(),
        LedgerCommand::Append {
            path,
            action,
            did,
            details,
            no_fsync,
        } => {
            let details: Value =
                serde_json::from_str(details).context("--details is not valid JSON")?;
            if !details.is_object() {
                bail!("--details must be a JSON object");
            }
            let config = LedgerConfig {
                path: path.clone(),
                durable: !no_fsync,
            };
            let ledger = AuditLedger::open(&config)
                .with_context(|| format!("opening ledger {}", path.display()))?;
            let receipt = ledger.append(action, did, details)?;
            println!("{}", serde_json::to_string(&receipt)?);
            Ok(0)
        }
        LedgerCommand::Show { path } => {
            for record in show_records(path)? {
                println!("{record}");
            }
            Ok(0)
        }
    }
}

/// Records of the ledger at `path` as persisted, so each one still hashes to
/// the `entry_hash` it carries.
pub fn show_records(path: &Path) -> Result<Vec<String>> {
    if !path.is_file() {
        bail!("ledger not found: {}", path.display());
    }
    let ledger = AuditLedger::new(JsonlFileStore::open(path, false)?);
    Ok(ledger.raw_records()?)
}

/// Check a ledger file: presence, chain integrity, typed read-back.
pub fn verify_ledger(path: &Path) -> CheckReport {
    let mut report = CheckReport::new();
    if !path.is_file() {
        report.fail("ledger_exists", format!("ledger not found: {}", path.display()));
        return report;
    }
    report.pass("ledger_exists", format!("ledger file present: {}", path.display()));

    let ledger = match JsonlFileStore::open(path, false) {
        Ok(store) => AuditLedger::new(store),
        Err(e) => {
            report.fail("ledger_readable", e.to_string());
            return report;
        }
    };

    match ledger.verify_integrity() {
        Ok(n) => report.pass("hash_chain_integrity", format!("entries_verified={n}")),
        Err(failure) => {
            report.fail("hash_chain_integrity", failure.to_string());
            return report;
        }
    }

    match ledger.entries() {
        Ok(entries) => report.pass("ledger_entries_readable", format!("entries={}", entries.len())),
        Err(e) => report.fail("ledger_entries_readable", e.to_string()),
    }
    report
}
