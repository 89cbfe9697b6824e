//! # Dispute Subcommand
//!
//! `verify` loads a case in external form and runs the history integrity
//! checks over it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::Value;

use freed_dispute::{verify_case_history_integrity, DisputeCase};

use crate::report::CheckReport;

/// Arguments for the `freed dispute` subcommand.
#[derive(Args, Debug)]
pub struct DisputeArgs {
    #[command(subcommand)]
    pub command: DisputeCommand,
}

#[derive(Subcommand, Debug)]
pub enum DisputeCommand {
    /// Verify a case's history integrity.
    Verify {
        /// Case JSON file.
        path: PathBuf,
    },
}

/// Execute the dispute subcommand.
pub fn run_dispute(args: &DisputeArgs) -> Result<u8> {
    match &args.command {
        DisputeCommand::Verify { path } => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let value: Value =
                serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
            verify_case(value).emit()
        }
    }
}

/// Schema check, then history integrity.
pub fn verify_case(value: Value) -> CheckReport {
    let mut report = CheckReport::new();
    let case: DisputeCase = match serde_json::from_value(value) {
        Ok(case) => case,
        Err(e) => {
            report.fail("case_schema", e.to_string());
            return report;
        }
    };
    report.pass(
        "case_schema",
        format!("case_id={} status={}", case.case_id, case.status),
    );

    let integrity = verify_case_history_integrity(&case);
    if integrity.ok {
        report.pass(
            "history_integrity",
            format!("history_entries={}", case.history.len()),
        );
    } else {
        report.fail("history_integrity", integrity.errors.join(","));
    }
    report
}
