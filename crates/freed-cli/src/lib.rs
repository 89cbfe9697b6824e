//! # freed-cli — Freed ID Verifier CLI
//!
//! Integrity checks over persisted governance artifacts. Each verify command
//! prints a JSON check report and exits non-zero when any check fails.
//!
//! ## Subcommands
//!
//! - `ledger` — verify, append to, or print a JSON Lines audit ledger
//! - `disclosure` — build or validate presentations, run disclosure vectors
//! - `dispute` — verify a dispute case's history
//!
//! ## Crate Policy
//!
//! - Argument parsing lives next to each handler; handlers delegate to the
//!   domain crates and hold no governance logic of their own.
//! - Reports go to stdout, logs to stderr.

pub mod disclosure;
pub mod dispute;
pub mod ledger;
pub mod report;
