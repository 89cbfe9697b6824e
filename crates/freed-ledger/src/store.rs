//! # Ledger Storage
//!
//! A [`LedgerStore`] holds raw record lines. It knows nothing about hashes;
//! the ledger serializes records before handing them over and verifies them
//! exactly as they come back.
//!
//! The chain tip lives in the store, not in the ledger handle. Every append
//! goes through [`LedgerStore::append_with`], which reads the current records
//! and writes the new one as a single step. [`JsonlFileStore`] makes that step
//! exclusive across handles and processes with an advisory lock on the file.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::LedgerError;

/// Backing storage for an [`crate::AuditLedger`].
pub trait LedgerStore: Send {
    /// All non-empty records, oldest first.
    fn read_records(&self) -> Result<Vec<String>, LedgerError>;

    /// Append one record. Returns only after the record is stored.
    fn append_record(&mut self, record: &str) -> Result<(), LedgerError>;

    /// Append the record `build` derives from the records stored right now,
    /// and return whatever else `build` produced.
    ///
    /// No other writer may append between the read and the write. The default
    /// holds only for stores reachable through a single `&mut` handle; stores
    /// shared between handles must override it.
    fn append_with<T, F>(&mut self, build: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&[String]) -> Result<(String, T), LedgerError>,
        Self: Sized,
    {
        let records = self.read_records()?;
        let (record, out) = build(&records)?;
        self.append_record(&record)?;
        Ok(out)
    }

    /// Remove every record.
    fn truncate(&mut self) -> Result<(), LedgerError>;

    /// Short description for log events.
    fn describe(&self) -> String;
}

/// JSON Lines file, one record per line.
///
/// Any number of `JsonlFileStore`s, in one process or several, may point at
/// the same path. Appends and truncation hold an exclusive `flock`-style lock
/// on the file; reads hold a shared one.
#[derive(Debug, Clone)]
pub struct JsonlFileStore {
    path: PathBuf,
    durable: bool,
}

impl JsonlFileStore {
    /// Open (or lazily create) a ledger file. Parent directories are created.
    pub fn open(path: impl Into<PathBuf>, durable: bool) -> Result<Self, LedgerError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path, durable })
    }

    /// Location of the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_locked(&self) -> Result<File, LedgerError> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        FileExt::lock_exclusive(&file).map_err(|e| lock_error(&self.path, e))?;
        Ok(file)
    }

    fn write_line(&self, mut file: &File, record: &str) -> Result<(), LedgerError> {
        let mut line = Vec::with_capacity(record.len() + 1);
        line.extend_from_slice(record.as_bytes());
        line.push(b'\n');
        file.write_all(&line)?;
        if self.durable {
            file.sync_data()?;
        }
        Ok(())
    }
}

impl LedgerStore for JsonlFileStore {
    fn read_records(&self) -> Result<Vec<String>, LedgerError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        FileExt::lock_shared(&file).map_err(|e| lock_error(&self.path, e))?;
        read_lines(&file)
    }

    fn append_record(&mut self, record: &str) -> Result<(), LedgerError> {
        let file = self.open_locked()?;
        self.write_line(&file, record)
    }

    fn append_with<T, F>(&mut self, build: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&[String]) -> Result<(String, T), LedgerError>,
    {
        // The lock is released when `file` is closed.
        let file = self.open_locked()?;
        let records = read_lines(&file)?;
        let (record, out) = build(&records)?;
        self.write_line(&file, &record)?;
        Ok(out)
    }

    fn truncate(&mut self) -> Result<(), LedgerError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.path)?;
        FileExt::lock_exclusive(&file).map_err(|e| lock_error(&self.path, e))?;
        file.set_len(0)?;
        if self.durable {
            file.sync_data()?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn read_lines(file: &File) -> Result<Vec<String>, LedgerError> {
    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            records.push(trimmed.to_string());
        }
    }
    Ok(records)
}

fn lock_error(path: &Path, err: std::io::Error) -> LedgerError {
    LedgerError::Io(std::io::Error::new(
        err.kind(),
        format!("failed to lock audit ledger {}: {err}", path.display()),
    ))
}

/// In-memory store for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<String>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing raw records.
    pub fn from_records(records: Vec<String>) -> Self {
        Self { records }
    }

    /// Raw records in append order.
    pub fn records(&self) -> &[String] {
        &self.records
    }

    /// Consume the store and return its raw records.
    pub fn into_records(self) -> Vec<String> {
        self.records
    }
}

impl LedgerStore for MemoryStore {
    fn read_records(&self) -> Result<Vec<String>, LedgerError> {
        Ok(self
            .records
            .iter()
            .filter(|r| !r.trim().is_empty())
            .cloned()
            .collect())
    }

    fn append_record(&mut self, record: &str) -> Result<(), LedgerError> {
        self.records.push(record.to_string());
        Ok(())
    }

    fn truncate(&mut self) -> Result<(), LedgerError> {
        self.records.clear();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
