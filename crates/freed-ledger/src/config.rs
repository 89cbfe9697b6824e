//! Audit ledger configuration.
//!
//! Defaults write `freed-id-audit-log.jsonl` in the working directory with a
//! `sync_data` after every append. Override via environment variables or
//! explicit construction for tests.

use std::path::PathBuf;

/// Default ledger file name.
pub const DEFAULT_LEDGER_PATH: &str = "freed-id-audit-log.jsonl";

/// Configuration for a file-backed audit ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Path of the JSON Lines ledger file.
    pub path: PathBuf,
    /// Flush each appended record to stable storage before acknowledging it.
    pub durable: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_LEDGER_PATH),
            durable: true,
        }
    }
}

impl LedgerConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `FREED_AUDIT_LEDGER_PATH` (default: `freed-id-audit-log.jsonl`)
    /// - `FREED_AUDIT_LEDGER_FSYNC` (default: `true`; accepts `true/false/1/0/yes/no`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let path = match lookup("FREED_AUDIT_LEDGER_PATH") {
            Some(p) if p.trim().is_empty() => {
                return Err(ConfigError::Empty("FREED_AUDIT_LEDGER_PATH".to_string()))
            }
            Some(p) => PathBuf::from(p),
            None => defaults.path,
        };
        let durable = match lookup("FREED_AUDIT_LEDGER_FSYNC") {
            Some(raw) => parse_bool("FREED_AUDIT_LEDGER_FSYNC", &raw)?,
            None => defaults.durable,
        };
        Ok(Self { path, durable })
    }

    /// Configuration for a ledger at `path` with durability on.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            durable: true,
        }
    }
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool(var.to_string(), raw.to_string())),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(String),
    #[error("invalid boolean for {0}: {1:?}")]
    InvalidBool(String, String),
}
