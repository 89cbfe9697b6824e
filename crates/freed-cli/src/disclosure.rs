//! # Disclosure Subcommand
//!
//! - `build` — filter a claims file into a presentation.
//! - `validate` — check a presentation file against a policy.
//! - `vectors` — run adversarial disclosure vectors.
//!
//! The policy starts from `DisclosureConfig::from_env()` and is then
//! adjusted by `--sensitive` (replaces the sensitive set), `--allow` (adds
//! allowed fields) and `--policy-version`. `vectors` always uses the default
//! sensitive set with each vector's own allowances.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde::Deserialize;
use serde_json::{Map, Value};

use freed_disclosure::{
    build_presentation, parse_list, validate_presentation, DisclosureConfig,
    MinimumDisclosurePolicy, PRESENTATION_VALID,
};

use crate::report::CheckReport;

/// Arguments for the `freed disclosure` subcommand.
#[derive(Args, Debug)]
pub struct DisclosureArgs {
    #[command(subcommand)]
    pub command: DisclosureCommand,
}

/// Policy adjustments shared by `build` and `validate`.
#[derive(Args, Debug, Default)]
pub struct PolicyArgs {
    /// Comma list of sensitive fields allowed for disclosure.
    #[arg(long)]
    pub allow: Option<String>,
    /// Comma list replacing the sensitive field set.
    #[arg(long)]
    pub sensitive: Option<String>,
    /// Policy version tag.
    #[arg(long)]
    pub policy_version: Option<String>,
}

impl PolicyArgs {
    /// Apply the flags on top of `base`.
    pub fn apply(&self, mut policy: MinimumDisclosurePolicy) -> Result<MinimumDisclosurePolicy> {
        if let Some(raw) = &self.sensitive {
            let fields = parse_list(raw);
            if fields.is_empty() {
                bail!("--sensitive must name at least one field");
            }
            policy = policy.with_sensitive_fields(fields);
        }
        if let Some(raw) = &self.allow {
            policy = policy.allowing(parse_list(raw));
        }
        if let Some(version) = &self.policy_version {
            policy = policy.with_version(version.clone());
        }
        Ok(policy)
    }

    fn resolve(&self) -> Result<MinimumDisclosurePolicy> {
        let config = DisclosureConfig::from_env().context("invalid disclosure configuration")?;
        self.apply(config.policy())
    }
}

#[derive(Subcommand, Debug)]
pub enum DisclosureCommand {
    /// Build a presentation from a claims JSON object.
    Build {
        /// Claims JSON file (an object of claim name to value).
        #[arg(long)]
        claims: PathBuf,
        /// Comma list of requested fields.
        #[arg(long)]
        fields: String,
        /// Subject DID recorded in the presentation.
        #[arg(long, default_value = "did:freed:subject")]
        subject: String,
        /// Credential id recorded in the presentation.
        #[arg(long, default_value = "did:freed:subject#cred-0")]
        credential: String,
        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Validate a presentation JSON file.
    Validate {
        /// Presentation JSON file.
        path: PathBuf,
        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Run adversarial disclosure vectors.
    Vectors {
        /// Vectors JSON file.
        path: PathBuf,
    },
}

/// Execute the disclosure subcommand.
pub fn run_disclosure(args: &DisclosureArgs) -> Result<u8> {
    match &args.command {
        DisclosureCommand::Build {
            claims,
            fields,
            subject,
            credential,
            policy,
        } => {
            let policy = policy.resolve()?;
            let claims = match read_json(claims)? {
                Value::Object(map) => map,
                _ => bail!("claims file must hold a JSON object"),
            };
            let requested: Vec<String> = fields
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            let presentation = build_presentation(subject, credential, &claims, requested, &policy);
            println!("{}", serde_json::to_string_pretty(&presentation.to_value()?)?);
            Ok(0)
        }
        DisclosureCommand::Validate { path, policy } => {
            let policy = policy.resolve()?;
            let presentation = read_json(path)?;
            validate_file(&presentation, &policy).emit()
        }
        DisclosureCommand::Vectors { path } => {
            let file: VectorFile = serde_json::from_value(read_json(path)?)
                .with_context(|| format!("malformed vectors file {}", path.display()))?;
            run_vectors(&file.vectors).emit()
        }
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Single-check report for one presentation.
pub fn validate_file(presentation: &Value, policy: &MinimumDisclosurePolicy) -> CheckReport {
    let mut report = CheckReport::new();
    match validate_presentation(presentation, policy) {
        Ok(()) => report.pass("presentation_schema", PRESENTATION_VALID),
        Err(violation) => report.fail("presentation_schema", violation.reason()),
    }
    report
}

// ── Adversarial vectors ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VectorFile {
    pub vectors: Vec<DisclosureVector>,
}

/// One adversarial case: what is asked for, what may be shown, and what the
/// engine is expected to disclose and deny.
#[derive(Debug, Clone, Deserialize)]
pub struct DisclosureVector {
    pub vector_id: String,
    pub claims: Map<String, Value>,
    pub requested_fields: Vec<String>,
    #[serde(default)]
    pub allowed_sensitive_fields: Vec<String>,
    pub expect_disclosed_fields: BTreeSet<String>,
    pub expect_denied_sensitive_fields: BTreeSet<String>,
}

/// Run every vector against the default sensitive set.
///
/// Four checks per vector, named `{vector_id}:{check}`.
pub fn run_vectors(vectors: &[DisclosureVector]) -> CheckReport {
    let mut report = CheckReport::new();
    if vectors.is_empty() {
        report.fail("vectors_present", "no vectors in file");
        return report;
    }
    for vector in vectors {
        let policy = MinimumDisclosurePolicy::default()
            .allowing(vector.allowed_sensitive_fields.iter().cloned());
        let presentation = build_presentation(
            "did:freed:vector-subject",
            &format!("did:freed:vector-subject#{}", vector.vector_id),
            &vector.claims,
            vector.requested_fields.iter().cloned(),
            &policy,
        );
        let id = &vector.vector_id;

        let schema = presentation
            .to_value()
            .map_err(|e| e.to_string())
            .and_then(|value| validate_presentation(&value, &policy).map_err(|v| v.reason()));
        match schema {
            Ok(()) => report.pass(format!("{id}:schema_validation"), PRESENTATION_VALID),
            Err(reason) => report.fail(format!("{id}:schema_validation"), reason),
        }

        let disclosed: BTreeSet<String> = presentation.disclosed_fields().map(str::to_string).collect();
        let denied = &presentation.denied_sensitive_fields;
        report.record(
            format!("{id}:expected_sets"),
            disclosed == vector.expect_disclosed_fields && *denied == vector.expect_denied_sensitive_fields,
            format!("disclosed={} denied={}", render(&disclosed), render(denied)),
        );

        let requested: BTreeSet<&str> = vector.requested_fields.iter().map(String::as_str).collect();
        let unrequested: Vec<&String> = disclosed.iter().filter(|f| !requested.contains(f.as_str())).collect();
        report.record(
            format!("{id}:no_unrequested_leak"),
            unrequested.is_empty(),
            format!("unrequested={}", render(unrequested)),
        );

        let leaked: Vec<&String> = disclosed.iter().filter(|f| policy.is_denied(f)).collect();
        report.record(
            format!("{id}:no_disallowed_sensitive_leak"),
            leaked.is_empty(),
            format!("leaked={}", render(leaked)),
        );
    }
    report
}

fn render<T: serde::Serialize>(fields: T) -> String {
    serde_json::to_string(&fields).unwrap_or_default()
}
