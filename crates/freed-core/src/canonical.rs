//! # Canonical Serialization — Sorted ASCII JSON
//!
//! `CanonicalBytes` is the sole construction path for bytes that feed a hash
//! or a MAC anywhere in the governance stack: ledger entry hashes, transition
//! payload digests, and the signatures computed over them.
//!
//! ## Security Invariant
//!
//! The inner `Vec<u8>` is private. Any function that hashes governance data
//! takes `&CanonicalBytes`, and the only way to get one is through the
//! encoder below. Two writers can therefore never disagree about key order,
//! escaping or whitespace for the same logical record.
//!
//! ## Rules
//!
//! The encoding is the one every FREED ledger on disk was hashed with, so
//! existing chains verify unchanged:
//!
//! 1. **Sort object keys** by Unicode code point, at every depth.
//! 2. **Compact separators**: `,` between items, `:` after keys.
//! 3. **ASCII only.** Every character outside `0x20..=0x7e` is written as a
//!    lowercase `\uXXXX` escape, astral characters as a surrogate pair.
//!    `\b`, `\f`, `\n`, `\r`, `\t`, `\"` and `\\` keep their short forms.
//! 4. **Floats** use the shortest repr that round-trips. Plain notation with
//!    at least one fractional digit (`1.0`, `0.0001`) for decimal exponents
//!    in `-4..16`, otherwise `d.ddde±XX` (`1e+16`, `1.5e-07`).

use std::io;

use serde::ser::{Serialize, Serializer};
use serde_json::ser::Formatter;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by the canonical encoder.
///
/// # Invariants
///
/// - The only constructors are [`CanonicalBytes::new()`] and
///   [`CanonicalBytes::from_value()`].
/// - Object keys are sorted, separators are compact.
/// - Every byte is printable ASCII.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::SerializationFailed` if the value
    /// cannot be represented as JSON (e.g., a map with non-string keys).
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        Self::from_value(value)
    }

    /// Construct canonical bytes from an already-built JSON value.
    ///
    /// Used by verifiers that re-hash records read back from storage, where
    /// the stored values must be hashed exactly as they were persisted.
    pub fn from_value(value: Value) -> Result<Self, CanonicalizationError> {
        let mut bytes = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut bytes, AsciiFormatter);
        SortedKeys(&value).serialize(&mut ser)?;
        Ok(Self(bytes))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Serializes a value with object keys in code point order regardless of the
/// map type `serde_json` was built with.
struct SortedKeys<'a>(&'a Value);

impl Serialize for SortedKeys<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Array(items) => serializer.collect_seq(items.iter().map(SortedKeys)),
            Value::Object(map) => {
                let mut entries: Vec<(&String, &Value)> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                serializer.collect_map(entries.into_iter().map(|(k, v)| (k, SortedKeys(v))))
            }
            scalar => scalar.serialize(serializer),
        }
    }
}

/// Compact formatter that escapes non-ASCII text and writes floats in
/// shortest round-trip repr.
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if (' '..='~').contains(&c) {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..i])?;
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = i + c.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(float_repr(value).as_bytes())
    }
}

/// Shortest round-trip decimal form of a finite float.
fn float_repr(value: f64) -> String {
    let sci = format!("{:e}", value.abs());
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let sign = if value.is_sign_negative() { "-" } else { "" };

    let body = if !(-4..16).contains(&exp) {
        let (lead, rest) = digits.split_at(1);
        let frac = if rest.is_empty() {
            String::new()
        } else {
            format!(".{rest}")
        };
        let exp_sign = if exp < 0 { '-' } else { '+' };
        format!("{lead}{frac}e{exp_sign}{:02}", exp.unsigned_abs())
    } else if exp >= 0 {
        let int_len = exp as usize + 1;
        if digits.len() > int_len {
            format!("{}.{}", &digits[..int_len], &digits[int_len..])
        } else {
            format!("{digits}{}.0", "0".repeat(int_len - digits.len()))
        }
    } else {
        format!("0.{}{digits}", "0".repeat((-exp - 1) as usize))
    };
    format!("{sign}{body}")
}
