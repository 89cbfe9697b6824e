//! # freed-disclosure — Minimum Disclosure Engine
//!
//! Turns a credential's claims plus a verifier's requested fields into a
//! presentation that reveals only what was asked for and what policy allows.
//!
//! For every claim:
//!
//! | requested | sensitive and not allowed | outcome             |
//! |-----------|---------------------------|---------------------|
//! | no        | any                       | redacted            |
//! | yes       | yes                       | redacted and denied |
//! | yes       | no                        | disclosed           |
//!
//! The engine is pure: no I/O, no shared state. Auditing a presentation is
//! the caller's job (the registry appends a `build_presentation` ledger
//! entry).

pub mod config;
pub mod policy;
pub mod presentation;
pub mod validate;

pub use config::{parse_list, ConfigError, DisclosureConfig};
pub use policy::{MinimumDisclosurePolicy, DEFAULT_POLICY_VERSION, DEFAULT_SENSITIVE_FIELDS};
pub use presentation::{build_presentation, build_presentation_at, Presentation};
pub use validate::{validate_presentation, DisclosureViolation, PRESENTATION_VALID};
